//! Template services
//!
//! - `reconcile`: rebinding a network's resources when its active template changes
//! - `import`: adding uploaded or forked templates under a free name
//! - `defaults`: resolving the inflow/outflow/junction types of a template

mod context;
mod unknown;
mod reconcile;
mod import;
mod defaults;
mod service;

pub use context::{complete_attributes, MigrationContext, MigrationReport, Resolution};
pub use unknown::{unknown_type, UNKNOWN_SVG, UNKNOWN_TYPE_NAME};
pub use reconcile::{Migration, ReconcileError, TemplateReconciler};
pub use import::{
    base_name, candidate_names, fork_template, prepare_for_import, BASE_TEMPLATE_KEY,
    MAX_NAME_ATTEMPTS,
};
pub use defaults::{default_types, DefaultTypeNames, DefaultTypes};
pub use service::TemplateService;
