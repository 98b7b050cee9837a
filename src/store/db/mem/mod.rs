use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use tracing::trace;

use crate::{
    ParamError, Result, ShareLock,
    model::ToggleRecord,
    store::{RecordStore, map_db_err},
};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, ToggleRecord>,
    last_id: i64,
}

impl Table {
    fn key_owner(
        &self,
        key: &str,
    ) -> Option<i64> {
        self.rows.values().find(|r| r.key == key).and_then(|r| r.id)
    }
}

/// In-process record store.
///
/// Every write runs under one lock, which makes the `key` uniqueness check
/// and the write a single step.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    table: ShareLock<Table>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table::default())),
        }
    }
}

impl RecordStore for MemStore {
    fn find_by_id(
        &self,
        id: i64,
    ) -> Result<Option<ToggleRecord>> {
        trace!("mem::find_by_id({})", id);
        let table = self.table.read().map_err(map_db_err)?;
        Ok(table.rows.get(&id).cloned())
    }

    fn find_by_key(
        &self,
        key: &str,
    ) -> Result<Option<ToggleRecord>> {
        trace!("mem::find_by_key({})", key);
        let table = self.table.read().map_err(map_db_err)?;
        Ok(table.rows.values().find(|r| r.key == key).cloned())
    }

    fn find_all(&self) -> Result<Vec<ToggleRecord>> {
        trace!("mem::find_all");
        let table = self.table.read().map_err(map_db_err)?;
        Ok(table.rows.values().cloned().collect())
    }

    fn count(&self) -> Result<usize> {
        let table = self.table.read().map_err(map_db_err)?;
        Ok(table.rows.len())
    }

    fn save(
        &self,
        record: &ToggleRecord,
    ) -> Result<ToggleRecord> {
        trace!("mem::save({:?}, {})", record.id, record.key);
        let mut table = self.table.write().map_err(map_db_err)?;

        if let Some(owner) = table.key_owner(&record.key) {
            if Some(owner) != record.id {
                return Err(ParamError::ConstraintViolation(format!("key {} already used by id {}", record.key, owner)));
            }
        }

        let mut saved = record.clone();
        let id = match record.id {
            Some(id) => {
                if let Some(existing) = table.rows.get(&id) {
                    saved.created_at = existing.created_at;
                }
                table.last_id = table.last_id.max(id);
                id
            }
            None => {
                let next = table.last_id.checked_add(1).ok_or_else(|| ParamError::Store(format!("id sequence exhausted at {}", table.last_id)))?;
                table.last_id = next;
                next
            }
        };
        saved.id = Some(id);
        table.rows.insert(id, saved.clone());

        Ok(saved)
    }

    fn update_enabled_state(
        &self,
        id: i64,
        enabled: bool,
    ) -> Result<()> {
        trace!("mem::update_enabled_state({}, {})", id, enabled);
        let mut table = self.table.write().map_err(map_db_err)?;
        if let Some(row) = table.rows.get_mut(&id) {
            row.enabled = enabled;
        }
        Ok(())
    }

    fn delete_by_id(
        &self,
        id: i64,
    ) -> Result<()> {
        trace!("mem::delete_by_id({})", id);
        let mut table = self.table.write().map_err(map_db_err)?;
        table.rows.remove(&id);
        Ok(())
    }
}
