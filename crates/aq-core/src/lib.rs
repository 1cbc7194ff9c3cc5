//! # aq-core
//!
//! Core types and utilities for Aquaplan.
//!
//! This crate provides the building blocks shared by the other crates:
//! - Common error types
//! - Identity traits
//! - Resource kinds
//! - Configuration types

pub mod error;
pub mod traits;
pub mod types;
pub mod config;

pub use error::*;
pub use traits::*;
pub use types::*;
