//! Validation errors raised by data fields and schemas.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! responses or WebSocket RPC error envelopes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single field that failed validation.
///
/// # Examples
/// ```
/// use openapi_kit::domain::ValidationError;
///
/// let err = ValidationError::new("title", "Too short");
/// assert_eq!(err.to_string(), "title: Too short");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Name of the offending field; empty when the whole payload is wrong.
    #[schema(example = "title")]
    pub field: String,
    /// Human-readable reason.
    #[schema(example = "Too short")]
    pub message: String,
}

impl ValidationError {
    /// Build an error for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every field error collected while validating one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(transparent)]
#[error("{}", joined(.0))]
pub struct ValidationErrors(Vec<ValidationError>);

fn joined(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Start an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record another failure.
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Whether nothing has failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the recorded failures.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// First error recorded against `field`, if any.
    pub fn for_field(&self, field: &str) -> Option<&ValidationError> {
        self.0.iter().find(|error| error.field == field)
    }

    /// Consume the collection.
    pub fn into_inner(self) -> Vec<ValidationError> {
        self.0
    }

    /// Turn the collection into a `Result`, failing when anything was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(value: ValidationError) -> Self {
        Self(vec![value])
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
