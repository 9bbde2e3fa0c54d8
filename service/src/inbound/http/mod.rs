//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod health;
pub mod spec;
pub mod state;
pub mod tasks;

pub use error::{ApiError, ApiResult};
pub use state::HttpState;
