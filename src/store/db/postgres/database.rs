use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::info;

use crate::{
    Result,
    config::PostgresConfig,
    model::ToggleRecord,
    store::RecordStore,
};

use super::{DbInit, collection::*, synclient::SynClient};

/// PostgreSQL-backed record store.
///
/// The `parametrization` table is created on construction when it does not
/// exist yet; `key_ref` carries the unique constraint on `key`.
pub struct PostgresStore {
    toggles: Arc<ToggleCollection>,
}

impl PostgresStore {
    pub fn new(
        config: &PostgresConfig,
        runtime: Arc<Runtime>,
    ) -> Result<Self> {
        let conn = Arc::new(SynClient::connect(config, runtime)?);
        let toggles = ToggleCollection::new(&conn);
        toggles.init()?;
        info!("postgres store ready");

        Ok(Self {
            toggles: Arc::new(toggles),
        })
    }
}

impl RecordStore for PostgresStore {
    fn find_by_id(
        &self,
        id: i64,
    ) -> Result<Option<ToggleRecord>> {
        self.toggles.find_by_id(id)
    }

    fn find_by_key(
        &self,
        key: &str,
    ) -> Result<Option<ToggleRecord>> {
        self.toggles.find_by_key(key)
    }

    fn find_all(&self) -> Result<Vec<ToggleRecord>> {
        self.toggles.find_all()
    }

    fn count(&self) -> Result<usize> {
        self.toggles.count()
    }

    fn save(
        &self,
        record: &ToggleRecord,
    ) -> Result<ToggleRecord> {
        self.toggles.save(record)
    }

    fn update_enabled_state(
        &self,
        id: i64,
        enabled: bool,
    ) -> Result<()> {
        self.toggles.update_enabled_state(id, enabled)
    }

    fn delete_by_id(
        &self,
        id: i64,
    ) -> Result<()> {
        self.toggles.delete_by_id(id)
    }
}
