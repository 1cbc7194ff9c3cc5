//! Store errors

use aq_core::{AqError, Id};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Id },

    #[error("Duplicate {0}")]
    Duplicate(String),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn not_found(entity: &'static str, id: Id) -> Self {
        StoreError::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<StoreError> for AqError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => AqError::not_found(entity, id),
            StoreError::Duplicate(message) => AqError::Conflict { message },
            StoreError::Invalid(message) => {
                let mut errors = aq_core::ValidationErrors::new();
                errors.add_base(message);
                AqError::Validation(errors)
            }
            StoreError::Backend(message) => AqError::external("resource store", message),
        }
    }
}
