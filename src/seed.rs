//! Default toggles inserted on first bring-up.

use tracing::info;

use crate::{Result, model::ToggleRecord, store::RecordStore};

const DEFAULTS: [(&str, &str, bool); 4] = [
    ("NEW_PAYMENT_GATEWAY", "Enable New Payment Gateway", true),
    ("BETA_FEATURES", "Enable Beta Features", false),
    ("EMAIL_NOTIFICATIONS", "Enable Email Notifications", true),
    ("DARK_MODE", "Enable Dark Mode", false),
];

/// Inserts the default toggles when the store is empty and returns how many
/// were written. Goes straight to the store, so no cache entry is touched.
pub fn load_defaults(store: &dyn RecordStore) -> Result<usize> {
    if store.count()? > 0 {
        info!("parametrization data already exists");
        return Ok(0);
    }

    for (key, description, enabled) in DEFAULTS {
        store.save(&ToggleRecord::new(key, description, enabled))?;
    }
    info!("parametrization data loaded: {} records", DEFAULTS.len());
    Ok(DEFAULTS.len())
}
