//! Network services
//!
//! Layout edits coming from the network editor. Changing the layout's
//! `active_template_id` runs the template reconciliation, changing its
//! `model_id` rebinds the network's model.

mod orphans;
mod update;

pub use orphans::{orphaned_attributes, OrphanedAttribute};
pub use update::{NetworkPatch, NetworkService, NetworkSettingsUpdate, MODEL_ID_KEY, SETTINGS_KEY};
