//! Lazily connected database container.
//!
//! The container is created at startup from the optional DSN. The pool is
//! built on first use (or by an explicit [`Database::connect`]) and dropped
//! by [`Database::close`] during shutdown.

use diesel_async::{RunQueryDsl, SimpleAsyncConnection};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::pool::{DbPool, PgConnection, PoolConfig, PoolError};

/// Errors raised by the database container.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatabaseError {
    /// No DSN was supplied.
    #[error("DSN not available")]
    ImproperlyConfigured,
    /// The pool failed to build or check out.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// A statement failed.
    #[error("database query failed: {message}")]
    Query {
        /// Driver supplied detail.
        message: String,
    },
}

impl From<diesel::result::Error> for DatabaseError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Query {
            message: err.to_string(),
        }
    }
}

/// Owner of the optional PostgreSQL pool.
///
/// # Examples
/// ```
/// use openapi_kit::outbound::persistence::{Database, DatabaseError};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let db = Database::new(None);
/// assert!(!db.is_configured());
/// assert_eq!(db.connect().await.unwrap_err(), DatabaseError::ImproperlyConfigured);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct Database {
    config: Option<PoolConfig>,
    pool: RwLock<Option<DbPool>>,
}

impl Database {
    /// Container for `config`; `None` leaves the database disabled.
    pub fn new(config: Option<PoolConfig>) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
        }
    }

    /// Whether a DSN was supplied.
    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Whether the pool is currently open.
    pub async fn is_connected(&self) -> bool {
        self.pool.read().await.is_some()
    }

    /// Build the pool unless it already exists and return a handle to it.
    ///
    /// # Errors
    ///
    /// [`DatabaseError::ImproperlyConfigured`] without a DSN, or the pool
    /// build failure.
    pub async fn connect(&self) -> Result<DbPool, DatabaseError> {
        if let Some(pool) = self.pool.read().await.as_ref() {
            return Ok(pool.clone());
        }
        let config = self
            .config
            .as_ref()
            .ok_or(DatabaseError::ImproperlyConfigured)?;

        let mut slot = self.pool.write().await;
        if let Some(pool) = slot.as_ref() {
            return Ok(pool.clone());
        }
        let pool = DbPool::new(config).await?;
        info!(
            url = %config.redacted_url(),
            min_size = config.min_size(),
            max_size = config.max_size(),
            "database pool ready"
        );
        *slot = Some(pool.clone());
        Ok(pool)
    }

    /// Check out a connection, connecting first when needed.
    ///
    /// # Errors
    ///
    /// See [`Database::connect`]; also fails when checkout times out.
    pub async fn connection(&self) -> Result<PgConnection, DatabaseError> {
        let pool = self.connect().await?;
        Ok(pool.get().await?)
    }

    /// Drop the pool. Calling it again is a no-op.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.write().await.take() {
            let (connections, idle) = pool.usage();
            info!(connections, idle, "closing database pool");
        }
    }

    /// Run `SELECT 1`.
    ///
    /// # Errors
    ///
    /// Any connection or query failure.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        let mut conn = self.connection().await?;
        diesel::sql_query("SELECT 1")
            .execute(&mut *conn)
            .await
            .map_err(|err| {
                warn!(error = %err, "database ping failed");
                DatabaseError::from(err)
            })?;
        Ok(())
    }

    /// Drop and recreate the `public` schema, discarding every table.
    ///
    /// # Errors
    ///
    /// Any connection or statement failure.
    pub async fn drop_all_schemas(&self) -> Result<(), DatabaseError> {
        let mut conn = self.connection().await?;
        conn.batch_execute("DROP SCHEMA IF EXISTS public CASCADE; CREATE SCHEMA IF NOT EXISTS public")
            .await?;
        warn!("public schema dropped and recreated");
        Ok(())
    }
}
