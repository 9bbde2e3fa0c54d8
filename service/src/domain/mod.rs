//! Domain primitives: data fields, schemas, filters and the task resource.
//!
//! Nothing here knows about HTTP or WebSockets. Inbound adapters translate
//! [`ValidationErrors`] and [`ports::RepositoryError`] into transport
//! responses.

pub mod error;
pub mod fields;
pub mod filters;
pub mod ports;
pub mod schema;
pub mod tasks;
pub mod trace_id;

pub use self::error::{ValidationError, ValidationErrors};
pub use self::filters::{Filter, FilterOp};
pub use self::schema::DataSchema;
pub use self::tasks::Task;
pub use self::trace_id::TraceId;
