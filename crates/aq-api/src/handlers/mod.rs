//! API request handlers

pub mod networks;
pub mod templates;
