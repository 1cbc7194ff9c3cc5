//! # aq-store
//!
//! Interfaces to the stores the services depend on:
//!
//! - [`ResourceStore`]: the external data service holding templates and networks
//! - [`ModelStore`]: local records binding networks to compute models
//!
//! In-memory implementations are provided for tests and for running the
//! server from a JSON seed file.

pub mod error;
pub mod resource;
pub mod model;
pub mod memory;
pub mod seed;

pub use error::{StoreError, StoreResult};
pub use resource::ResourceStore;
pub use model::ModelStore;
pub use memory::{MemoryModelStore, MemoryResourceStore};
pub use seed::SeedData;
