mod toggle;

use std::sync::Arc;

use super::synclient::SynClient;

pub use toggle::ToggleCollection;

pub type DbConnection = Arc<SynClient>;
