//! # aq-services
//!
//! Business logic for Aquaplan.
//!
//! - [`templates`]: switching a network's active template, importing
//!   templates, resolving default types
//! - [`models`]: keeping a network bound to a compute model
//! - [`networks`]: network updates coming from the API

pub mod validation;
pub mod templates;
pub mod models;
pub mod networks;

#[cfg(test)]
pub(crate) mod testing;

pub use templates::{DefaultTypeNames, Migration, MigrationReport, ReconcileError, TemplateReconciler, TemplateService};
pub use models::{ModelAssociation, ModelBinding, ModelSource};
pub use networks::{NetworkPatch, NetworkService, NetworkSettingsUpdate, OrphanedAttribute};
