//! Limit/offset pagination primitives shared by list endpoints.
//!
//! A [`PageRequest`] is derived from raw `limit`/`offset` query values and a
//! set of [`PaginationLimits`]. [`Pagination::links`] renders the matching
//! RFC 8288 `Link` header so clients can walk the collection without
//! recomputing offsets themselves.

mod links;
mod request;

pub use links::{Pagination, Rel, TOTAL_COUNT_HEADER};
pub use request::{PageRequest, PaginationLimits};

/// Errors raised while interpreting pagination input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    /// The `limit` query value is not a positive integer.
    #[error("limit must be a positive integer, got '{value}'")]
    InvalidLimit {
        /// Raw value supplied by the client.
        value: String,
    },
    /// The `offset` query value is not a non-negative integer.
    #[error("offset must be a non-negative integer, got '{value}'")]
    InvalidOffset {
        /// Raw value supplied by the client.
        value: String,
    },
    /// The configured default or maximum limit is unusable.
    #[error("default limit {default} must be between 1 and the maximum limit {max}")]
    InvalidLimits {
        /// Configured default page size.
        default: u32,
        /// Configured maximum page size.
        max: u32,
    },
}

impl PaginationError {
    /// Name of the query parameter the error refers to, if any.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidLimit { .. } => Some("limit"),
            Self::InvalidOffset { .. } => Some("offset"),
            Self::InvalidLimits { .. } => None,
        }
    }
}
