//! Core error types for Aquaplan

use std::collections::HashMap;
use thiserror::Error;

/// Standard Result type for Aquaplan operations
pub type AqResult<T> = Result<T, AqError>;

/// Core error type shared across crates
#[derive(Error, Debug)]
pub enum AqError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },
}

impl AqError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        AqError::NotFound {
            entity,
            field: "id",
            value: id.to_string(),
        }
    }

    pub fn external(service: impl Into<String>, message: impl Into<String>) -> Self {
        AqError::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            AqError::NotFound { .. } => 404,
            AqError::Validation(_) => 422,
            AqError::Conflict { .. } => 409,
            AqError::Internal(_) | AqError::Config(_) => 500,
            AqError::ExternalService { .. } => 502,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AqError::NotFound { .. } => "not_found",
            AqError::Validation(_) => "validation_failed",
            AqError::Internal(_) => "internal_error",
            AqError::Config(_) => "configuration_error",
            AqError::ExternalService { .. } => "external_service_error",
            AqError::Conflict { .. } => "conflict",
        }
    }
}

/// Validation errors collection
#[derive(Error, Debug, Default, Clone)]
#[error("Validation errors: {errors:?}")]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> Vec<error_messages>
    pub errors: HashMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        let mut fields: Vec<_> = self.errors.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        for (field, field_messages) in fields {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }
}
