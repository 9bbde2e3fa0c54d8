//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only depend on domain ports,
//! so tests can swap in the in-memory repository.

use std::sync::Arc;

use pagination::{PaginationError, PaginationLimits};

use crate::domain::ports::TaskRepository;
use crate::domain::tasks::{new_task_schema, task_schema};
use crate::domain::{DataSchema, ValidationError, ValidationErrors};
use crate::settings::ErrorMessages;

use super::error::ApiError;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Message templates for error bodies.
    pub messages: ErrorMessages,
    /// Page size bounds for list endpoints.
    pub pagination: PaginationLimits,
    /// Task storage.
    pub tasks: Arc<dyn TaskRepository>,
    /// Stored task schema, used for dumping and filters.
    pub task_schema: Arc<DataSchema>,
    /// Client task payload schema.
    pub new_task_schema: Arc<DataSchema>,
}

impl HttpState {
    /// Bundle `tasks` with the configured messages and limits.
    pub fn new(
        messages: ErrorMessages,
        pagination: PaginationLimits,
        tasks: Arc<dyn TaskRepository>,
    ) -> Self {
        Self {
            messages,
            pagination,
            tasks,
            task_schema: Arc::new(task_schema()),
            new_task_schema: Arc::new(new_task_schema()),
        }
    }

    /// 422 for failed validation.
    pub fn bad_data(&self, errors: impl Into<ValidationErrors>) -> ApiError {
        ApiError::bad_data(&self.messages, errors)
    }

    /// 422 for unusable `limit`/`offset` values.
    pub fn bad_page(&self, error: &PaginationError) -> ApiError {
        let field = error.field().unwrap_or_default();
        self.bad_data(ValidationError::new(field, error.to_string()))
    }

    /// 500 after logging `cause`.
    pub fn internal(&self, cause: impl std::fmt::Display) -> ApiError {
        ApiError::internal(&self.messages, cause)
    }
}
