//! Domain ports implemented by driven adapters.
//!
//! Adapters map their failures into [`RepositoryError`] so inbound handlers
//! can treat every backend alike.

use async_trait::async_trait;
use thiserror::Error;

use super::{Filter, Task, ValidationErrors};

/// Failures raised by repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The backing store could not be reached.
    #[error("repository connection failed: {message}")]
    Connection {
        /// Adapter supplied detail.
        message: String,
    },
    /// A query or mutation failed while executing.
    #[error("repository query failed: {message}")]
    Query {
        /// Adapter supplied detail.
        message: String,
    },
}

impl RepositoryError {
    /// Connection failure with `message`.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Query failure with `message`.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Change applied to a stored task while the repository holds it.
pub type TaskChange = Box<dyn FnOnce(&Task) -> Result<Task, ValidationErrors> + Send>;

/// Failures of [`TaskRepository::update`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    /// The change refused the stored task.
    #[error("task update rejected: {0}")]
    Rejected(ValidationErrors),
    /// The store itself failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Storage for [`Task`] records.
///
/// Listing preserves insertion order so limit/offset pages are stable.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Every task matching all `filters`, oldest first.
    async fn list(&self, filters: &[Filter]) -> Result<Vec<Task>, RepositoryError>;

    /// Fetch one task by identifier.
    async fn get(&self, id: &str) -> Result<Option<Task>, RepositoryError>;

    /// Store a new task.
    async fn insert(&self, task: Task) -> Result<(), RepositoryError>;

    /// Replace task `id` with the result of `change`, atomically with respect
    /// to other writers. `None` when it does not exist.
    async fn update(&self, id: &str, change: TaskChange) -> Result<Option<Task>, UpdateError>;

    /// Remove a task; `false` when it does not exist.
    async fn delete(&self, id: &str) -> Result<bool, RepositoryError>;
}
