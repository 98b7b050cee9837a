//! The parametrization service: CRUD over toggle records with a
//! read-through, write-invalidate cache.
//!
//! Reads go through [`Cache::get_or_compute`]; writes hit the store first
//! and then evict whole namespaces. The per-write eviction set is:
//!
//! | operation         | `Record` | `Collection` |
//! |-------------------|----------|--------------|
//! | `save`            |          | evicted      |
//! | `set_enabled`     | evicted  | evicted      |
//! | `delete`          | evicted  | evicted      |
//! | `delete_no_cache` |          |              |
//!
//! `save` leaves cached single-record lookups in place, so `get_by_id` and
//! `get_by_key` can serve the pre-save value until another write evicts the
//! `Record` namespace. `delete_no_cache` evicts nothing, so the deleted
//! record stays readable from the cache in the same way.

use std::sync::Arc;

use tracing::{info, trace};

use crate::{
    Result,
    cache::{Cache, CacheKey, Namespace},
    model::ToggleRecord,
    store::RecordStore,
};

#[derive(Clone)]
pub struct ParametrizationService {
    store: Arc<dyn RecordStore>,
    cache: Cache,
}

impl ParametrizationService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        cache: Cache,
    ) -> Self {
        Self {
            store,
            cache,
        }
    }

    /// Every record, served from the `Collection` namespace.
    pub fn list_all(&self) -> Result<Vec<ToggleRecord>> {
        trace!("service::list_all");
        self.cache.get_or_compute(Namespace::Collection, &CacheKey::All, || self.store.find_all())
    }

    pub fn get_by_id(
        &self,
        id: i64,
    ) -> Result<Option<ToggleRecord>> {
        trace!("service::get_by_id({})", id);
        self.cache.get_or_compute(Namespace::Record, &CacheKey::Id(id), || self.store.find_by_id(id))
    }

    pub fn get_by_key(
        &self,
        key: &str,
    ) -> Result<Option<ToggleRecord>> {
        trace!("service::get_by_key({})", key);
        self.cache.get_or_compute(Namespace::Record, &CacheKey::Key(key.to_string()), || self.store.find_by_key(key))
    }

    /// Inserts or replaces `record` and evicts the `Collection` namespace only.
    pub fn save(
        &self,
        record: &ToggleRecord,
    ) -> Result<ToggleRecord> {
        trace!("service::save({:?}, {})", record.id, record.key);
        let saved = self.store.save(record)?;
        self.cache.evict_all(Namespace::Collection)?;
        info!("saved parametrization {} ({:?})", saved.key, saved.id);
        Ok(saved)
    }

    /// Sets `enabled` on `id` without checking it exists, then evicts both
    /// namespaces.
    pub fn set_enabled(
        &self,
        enabled: bool,
        id: i64,
    ) -> Result<()> {
        trace!("service::set_enabled({}, {})", enabled, id);
        self.store.update_enabled_state(id, enabled)?;
        self.evict_everything()?;
        info!("parametrization {} enabled={}", id, enabled);
        Ok(())
    }

    /// Deletes `id` and evicts both namespaces.
    pub fn delete(
        &self,
        id: i64,
    ) -> Result<()> {
        trace!("service::delete({})", id);
        self.store.delete_by_id(id)?;
        self.evict_everything()?;
        info!("deleted parametrization {}", id);
        Ok(())
    }

    /// Deletes `id` and leaves the cache alone. Cached lookups of the
    /// record keep answering until another write evicts them.
    pub fn delete_no_cache(
        &self,
        id: i64,
    ) -> Result<()> {
        trace!("service::delete_no_cache({})", id);
        self.store.delete_by_id(id)?;
        info!("deleted parametrization {} without cache eviction", id);
        Ok(())
    }

    fn evict_everything(&self) -> Result<()> {
        self.cache.evict_all(Namespace::Record)?;
        self.cache.evict_all(Namespace::Collection)
    }
}
