//! Conversion of `validator` results into service errors

use aq_core::{AqError, ValidationErrors};
use validator::Validate;

/// Validate an input, collecting field messages into [`AqError::Validation`]
pub fn validate<T: Validate>(input: &T) -> Result<(), AqError> {
    input.validate().map_err(|errors| AqError::Validation(collect(&errors)))
}

fn collect(errors: &validator::ValidationErrors) -> ValidationErrors {
    let mut collected = ValidationErrors::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("is invalid ({})", error.code));
            collected.add(field.to_string(), message);
        }
    }
    // nested (list) errors do not show up as field errors
    if collected.is_empty() {
        collected.add_base(errors.to_string());
    }
    collected
}
