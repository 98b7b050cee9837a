use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tracing::info;

use crate::{
    Config, ParamError, ParametrizationService, Result, StoreType,
    cache::Cache,
    seed,
    store::{MemStore, PostgresStore, RecordStore},
};

/// Wires a [`ParametrizationService`] from configuration.
///
/// The store and cache come from `config` unless given explicitly; the
/// runtime is only needed by the postgres store and is created on demand.
#[derive(Default)]
pub struct ServiceBuilder {
    config: Config,
    rt: Option<Arc<Runtime>>,
    store: Option<Arc<dyn RecordStore>>,
    cache: Option<Cache>,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn runtime(
        mut self,
        runtime: Arc<Runtime>,
    ) -> Self {
        self.rt = Some(runtime);
        self
    }

    pub fn store(
        mut self,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        self.store = Some(store);
        self
    }

    pub fn cache(
        mut self,
        cache: Cache,
    ) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(&self) -> Result<ParametrizationService> {
        let store = match &self.store {
            Some(store) => store.clone(),
            None => self.build_store()?,
        };

        if self.config.seed.enabled {
            seed::load_defaults(store.as_ref())?;
        }

        let cache = match &self.cache {
            Some(cache) => cache.clone(),
            None => Cache::from_config(&self.config.cache)?,
        };
        info!("service ready: store={}, cache={}", self.config.store.store_type.as_ref(), self.config.cache.backend.as_ref());

        Ok(ParametrizationService::new(store, cache))
    }

    fn build_store(&self) -> Result<Arc<dyn RecordStore>> {
        match self.config.store.store_type {
            StoreType::Mem => Ok(Arc::new(MemStore::new())),
            StoreType::Postgres => {
                let postgres = self.config.store.postgres.as_ref().ok_or_else(|| ParamError::Config("Postgres configuration is required when store type is Postgres".to_string()))?;
                let runtime = match &self.rt {
                    Some(rt) => rt.clone(),
                    None => Arc::new(Builder::new_multi_thread().worker_threads(self.config.async_worker_thread_number.into()).enable_all().build()?),
                };
                Ok(Arc::new(PostgresStore::new(postgres, runtime)?))
            }
        }
    }
}
