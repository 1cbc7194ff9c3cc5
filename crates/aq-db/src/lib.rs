//! # aq-db
//!
//! PostgreSQL access for the records this service owns: compute models and
//! their bindings to networks. Templates and networks live in the external
//! resource store and are not persisted here.
//!
//! ## Example
//!
//! ```ignore
//! use aq_db::{Database, DatabaseConfig, PgModelStore};
//!
//! let db = Database::connect(&DatabaseConfig::with_url(url)).await?;
//! db.ensure_schema().await?;
//! let models = PgModelStore::new(db.pool().clone());
//! ```

pub mod pool;
pub mod models;

pub use pool::{Database, DatabaseConfig, PoolStats};
pub use models::PgModelStore;
