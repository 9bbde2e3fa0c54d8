//! Micro-service toolkit built on Actix Web.
//!
//! The crate bundles the pieces a small JSON service needs:
//!
//! - [`domain`]: typed data fields, schema validation and OpenAPI emission
//! - [`inbound`]: HTTP handlers and the WebSocket RPC protocol
//! - [`outbound`]: the database container and in-memory repositories
//! - [`settings`]: environment-driven configuration
//! - [`server`]: application wiring used by the `openapi-kit` binary

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
pub mod settings;

/// Public OpenAPI surface used by the spec route and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
pub use settings::ServiceSettings;
