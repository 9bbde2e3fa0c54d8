//! HTTP rendering of domain failures.
//!
//! Handlers return [`ApiError`], built through [`HttpState`] so the message
//! templates come from configuration. Bodies have the shape
//! `{"message": ..., "errors": [{"field", "message"}]}` with `errors`
//! omitted when empty.
//!
//! [`HttpState`]: super::state::HttpState

use std::fmt::Display;

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, web};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::{TraceId, ValidationError, ValidationErrors};
use crate::settings::ErrorMessages;

/// Result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human readable summary.
    #[schema(example = "Invalid data format")]
    pub message: String,
    /// Per-field failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
}

/// A failure rendered as an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request failed validation (422).
    #[error("{message}")]
    BadData {
        /// Configured bad-data message.
        message: String,
        /// Field failures.
        errors: ValidationErrors,
    },
    /// The addressed resource does not exist (404).
    #[error("{resource} not found")]
    NotFound {
        /// Resource name.
        resource: &'static str,
    },
    /// Something unexpected happened (500). The cause is logged, not returned.
    #[error("{message}")]
    Internal {
        /// Configured internal-error message.
        message: String,
    },
}

impl ApiError {
    /// 422 carrying `errors`.
    pub fn bad_data(messages: &ErrorMessages, errors: impl Into<ValidationErrors>) -> Self {
        Self::BadData {
            message: messages.bad_data.clone(),
            errors: errors.into(),
        }
    }

    /// 404 for `resource`.
    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    /// 500 after logging `cause` with the active trace identifier.
    pub fn internal(messages: &ErrorMessages, cause: impl Display) -> Self {
        match TraceId::current() {
            Some(trace_id) => error!(error = %cause, trace_id = %trace_id, "request failed"),
            None => error!(error = %cause, "request failed"),
        }
        Self::Internal {
            message: messages.internal.clone(),
        }
    }

    /// The response body.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            message: self.to_string(),
            errors: match self {
                Self::BadData { errors, .. } => errors.iter().cloned().collect(),
                _ => Vec::new(),
            },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.body())
    }
}

/// JSON extractor settings answering malformed bodies with a 422.
pub fn json_config(messages: ErrorMessages) -> web::JsonConfig {
    web::JsonConfig::default().error_handler(move |err: JsonPayloadError, _req: &HttpRequest| {
        ApiError::bad_data(&messages, ValidationError::new("", err.to_string())).into()
    })
}

/// Query extractor settings answering malformed query strings with a 422.
pub fn query_config(messages: ErrorMessages) -> web::QueryConfig {
    web::QueryConfig::default().error_handler(move |err: QueryPayloadError, _req: &HttpRequest| {
        ApiError::bad_data(&messages, ValidationError::new("", err.to_string())).into()
    })
}
