//! PostgreSQL access through `diesel-async` with `bb8` pooling.
//!
//! The service does not own any tables; the [`Database`] container exposes
//! pooled connections, a liveness ping and a schema reset for applications
//! built on top of it.

mod database;
mod pool;

pub use database::{Database, DatabaseError};
pub use pool::{DbPool, PgConnection, PoolConfig, PoolError};
