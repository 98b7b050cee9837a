//! Cache layer in front of the record store.
//!
//! Values are kept as JSON text in named namespaces. A namespace is the unit
//! of bulk invalidation: writers evict whole namespaces and readers
//! repopulate them lazily through [`Cache::get_or_compute`].

mod distributed;
mod local;

use std::{fmt, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use strum::{AsRefStr, EnumIter};
use tracing::debug;

use crate::{CacheBackendType, CacheConfig, ParamError, Result};

pub use distributed::RedisCache;
pub use local::MemCache;

/// Named group of cache entries that are evicted together.
#[derive(Debug, Clone, Copy, AsRefStr, PartialEq, Hash, Eq, EnumIter)]
pub enum Namespace {
    /// Single records, looked up by id or by key.
    #[strum(serialize = "parametrization")]
    Record,
    /// The full listing, stored under one entry.
    #[strum(serialize = "allParametrizations")]
    Collection,
}

/// Key of an entry inside a namespace.
///
/// Lookups by id and by key share [`Namespace::Record`]; the rendered form is
/// tagged with the lookup kind so a numeric-looking key never collides with
/// an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Id(i64),
    Key(String),
    All,
}

impl fmt::Display for CacheKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            CacheKey::Id(id) => write!(f, "id:{}", id),
            CacheKey::Key(key) => write!(f, "key:{}", key),
            CacheKey::All => f.write_str("all"),
        }
    }
}

/// Storage behind a [`Cache`].
///
/// Implementations must never store a failed `init`.
pub trait CacheBackend: Send + Sync {
    /// Returns the value under `key`, computing and storing it with `init`
    /// on a miss.
    fn get_or_insert_with(
        &self,
        namespace: Namespace,
        key: &str,
        init: &mut dyn FnMut() -> Result<String>,
    ) -> Result<String>;

    /// Removes one entry.
    fn evict(
        &self,
        namespace: Namespace,
        key: &str,
    ) -> Result<()>;

    /// Removes every entry of the namespace.
    fn evict_all(
        &self,
        namespace: Namespace,
    ) -> Result<()>;
}

/// Typed cache capability handed to the service.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
        }
    }

    /// Builds the backend selected by `config.backend`.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let backend: Arc<dyn CacheBackend> = match config.backend {
            CacheBackendType::Distributed => Arc::new(RedisCache::new(&config.redis)?),
            CacheBackendType::Local => Arc::new(MemCache::new(config.local.capacity)),
        };
        Ok(Self::new(backend))
    }

    /// Returns the cached value, or runs `supplier`, caches its result and
    /// returns it. A failing supplier leaves the cache untouched.
    pub fn get_or_compute<T, F>(
        &self,
        namespace: Namespace,
        key: &CacheKey,
        supplier: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        let mut supplier = Some(supplier);
        let raw = self.backend.get_or_insert_with(namespace, &key.to_string(), &mut || -> Result<String> {
            let supplier = supplier.take().ok_or_else(|| ParamError::Cache(format!("loader for {} ran twice", key)))?;
            debug!("cache miss {}::{}", namespace.as_ref(), key);
            Ok(serde_json::to_string(&supplier()?)?)
        })?;
        serde_json::from_str(&raw).map_err(|e| ParamError::Cache(format!("undecodable cache entry {}::{}: {}", namespace.as_ref(), key, e)))
    }

    pub fn evict(
        &self,
        namespace: Namespace,
        key: &CacheKey,
    ) -> Result<()> {
        debug!("cache evict {}::{}", namespace.as_ref(), key);
        self.backend.evict(namespace, &key.to_string())
    }

    pub fn evict_all(
        &self,
        namespace: Namespace,
    ) -> Result<()> {
        debug!("cache evict all {}", namespace.as_ref());
        self.backend.evict_all(namespace)
    }
}
