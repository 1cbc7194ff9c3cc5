//! # aq-api
//!
//! JSON API handlers for Aquaplan.
//!
//! Responses wrap their payload in a named envelope (`{"network": ...}`,
//! `{"templates": [...]}`); updates answer `204 No Content`.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;

pub use extractors::AppState;
pub use routes::router;
