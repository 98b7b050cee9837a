mod toggle;

pub use toggle::{ToggleDraft, ToggleRecord};
