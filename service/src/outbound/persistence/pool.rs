//! Bounded async connection pool for PostgreSQL.
//!
//! Wraps `diesel-async` and `bb8`. The pool keeps at least `min_size`
//! connections idle and never opens more than `max_size`.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use url::Url;

/// A pooled connection that owns its handle on the pool.
pub type PgConnection = PooledConnection<'static, AsyncPgConnection>;

/// Errors raised while configuring or using the pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// `min_size` exceeds `max_size`, or `max_size` is zero.
    #[error("invalid pool bounds: min {min_size}, max {max_size}")]
    InvalidBounds {
        /// Requested idle floor.
        min_size: u32,
        /// Requested connection ceiling.
        max_size: u32,
    },
    /// Failed to check out a connection.
    #[error("failed to get connection from pool: {message}")]
    Checkout {
        /// Driver supplied detail.
        message: String,
    },
    /// Failed to build the pool.
    #[error("failed to build connection pool: {message}")]
    Build {
        /// Driver supplied detail.
        message: String,
    },
}

impl PoolError {
    /// Checkout failure with `message`.
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    /// Build failure with `message`.
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Connection pool settings.
///
/// # Examples
/// ```
/// use openapi_kit::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://app:secret@db/app", 2, 10).unwrap();
/// assert_eq!(config.redacted_url(), "postgres://app:redacted@db/app");
/// assert!(PoolConfig::new("postgres://db/app", 5, 1).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    database_url: String,
    min_size: u32,
    max_size: u32,
    connection_timeout: Duration,
}

impl PoolConfig {
    /// Settings for `database_url` with the given bounds and a 30 second
    /// checkout timeout.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidBounds`] when `min_size > max_size` or
    /// `max_size == 0`.
    pub fn new(
        database_url: impl Into<String>,
        min_size: u32,
        max_size: u32,
    ) -> Result<Self, PoolError> {
        if max_size == 0 || min_size > max_size {
            return Err(PoolError::InvalidBounds { min_size, max_size });
        }
        Ok(Self {
            database_url: database_url.into(),
            min_size,
            max_size,
            connection_timeout: Duration::from_secs(30),
        })
    }

    /// Override the checkout timeout.
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// The DSN.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// The DSN with any password masked, for logging.
    pub fn redacted_url(&self) -> String {
        match Url::parse(&self.database_url) {
            Ok(mut url) if url.password().is_some() => {
                if url.set_password(Some("redacted")).is_err() {
                    return "<redacted>".to_owned();
                }
                url.to_string()
            }
            Ok(url) => url.to_string(),
            Err(_) => "<redacted>".to_owned(),
        }
    }

    /// Idle connections kept open.
    pub fn min_size(&self) -> u32 {
        self.min_size
    }

    /// Connection ceiling.
    pub fn max_size(&self) -> u32 {
        self.max_size
    }
}

/// Async PostgreSQL pool.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl std::fmt::Debug for DbPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state();
        f.debug_struct("DbPool")
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

impl DbPool {
    /// Build a pool from `config`.
    ///
    /// # Errors
    ///
    /// [`PoolError::Build`] when the pool cannot be constructed.
    pub async fn new(config: &PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url());
        let inner = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(config.min_size))
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Check out a connection that may outlive the borrow of the pool.
    ///
    /// # Errors
    ///
    /// [`PoolError::Checkout`] when no connection frees up within the
    /// configured timeout.
    pub async fn get(&self) -> Result<PgConnection, PoolError> {
        self.inner
            .get_owned()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }

    /// Open and idle connection counts.
    pub fn usage(&self) -> (u32, u32) {
        let state = self.inner.state();
        (state.connections, state.idle_connections)
    }
}
