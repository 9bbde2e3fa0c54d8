//! In-process task store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{RepositoryError, TaskChange, TaskRepository, UpdateError};
use crate::domain::{Filter, Task};

/// [`TaskRepository`] keeping tasks in insertion order behind a lock.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<Vec<Task>>,
}

impl InMemoryTaskRepository {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list(&self, filters: &[Filter]) -> Result<Vec<Task>, RepositoryError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().filter(|task| task.matches(filters)).cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Task>, RepositoryError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|task| task.id == id).cloned())
    }

    async fn insert(&self, task: Task) -> Result<(), RepositoryError> {
        let mut tasks = self.tasks.write().await;
        if tasks.iter().any(|existing| existing.id == task.id) {
            return Err(RepositoryError::query(format!("duplicate task id {}", task.id)));
        }
        tasks.push(task);
        Ok(())
    }

    async fn update(&self, id: &str, change: TaskChange) -> Result<Option<Task>, UpdateError> {
        let mut tasks = self.tasks.write().await;
        let Some(slot) = tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };
        let updated = change(slot).map_err(UpdateError::Rejected)?;
        *slot = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        Ok(tasks.len() != before)
    }
}
