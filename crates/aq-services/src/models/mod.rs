//! Model services
//!
//! Keeps networks bound to the compute model that runs their template.

mod association;

pub use association::{ModelAssociation, ModelBinding, ModelSource};
