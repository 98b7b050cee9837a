//! Storage layer for persisting toggle records.
//!
//! Provides an abstraction over different storage backends:
//! - `MemStore`: In-memory storage for testing and single-node runs
//! - `PostgresStore`: PostgreSQL for production persistence

mod db;

use std::error::Error;

use crate::{ParamError, Result, model::ToggleRecord};

pub use db::{MemStore, PostgresStore};

/// Maps lock and driver errors that carry no richer classification.
fn map_db_err(err: impl Error) -> ParamError {
    ParamError::Store(err.to_string())
}

/// Source of truth for toggle records.
///
/// Writes against a missing id are not errors: `update_enabled_state` and
/// `delete_by_id` succeed without touching anything.
pub trait RecordStore: Send + Sync {
    /// Finds a record by its numeric id.
    fn find_by_id(
        &self,
        id: i64,
    ) -> Result<Option<ToggleRecord>>;

    /// Finds a record by its business key.
    fn find_by_key(
        &self,
        key: &str,
    ) -> Result<Option<ToggleRecord>>;

    /// Returns every record ordered by id.
    fn find_all(&self) -> Result<Vec<ToggleRecord>>;

    /// Number of stored records.
    fn count(&self) -> Result<usize>;

    /// Inserts the record when `id` is absent, otherwise replaces the row
    /// with that id (inserting it if missing). `created_at` of an existing
    /// row is kept.
    ///
    /// Fails with [`ParamError::ConstraintViolation`] when `key` belongs to
    /// a different record.
    fn save(
        &self,
        record: &ToggleRecord,
    ) -> Result<ToggleRecord>;

    /// Sets `enabled` on the row with `id`. A missing id affects zero rows.
    fn update_enabled_state(
        &self,
        id: i64,
        enabled: bool,
    ) -> Result<()>;

    /// Removes the row with `id`. A missing id affects zero rows.
    fn delete_by_id(
        &self,
        id: i64,
    ) -> Result<()>;
}
