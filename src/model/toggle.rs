use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named boolean feature flag.
///
/// `id` is `None` until the record store assigns one. `created_at` is set
/// once on creation; stores keep the persisted value when a record is
/// replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub key: String,
    pub description: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl ToggleRecord {
    /// Creates an unsaved record stamped with the current time.
    pub fn new(
        key: impl Into<String>,
        description: impl Into<String>,
        enabled: bool,
    ) -> Self {
        Self {
            id: None,
            key: key.into(),
            description: description.into(),
            enabled,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(
        mut self,
        id: i64,
    ) -> Self {
        self.id = Some(id);
        self
    }
}

/// The client-supplied part of a record: everything the store does not own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleDraft {
    pub key: String,
    pub description: String,
    pub enabled: bool,
}

impl From<ToggleDraft> for ToggleRecord {
    fn from(draft: ToggleDraft) -> Self {
        ToggleRecord::new(draft.key, draft.description, draft.enabled)
    }
}
