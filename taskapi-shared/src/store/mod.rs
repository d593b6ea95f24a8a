/// Task store contract
///
/// [`TaskStore`] is the seam between request handling and persistence. Every
/// task operation after creation takes the requesting user's id and must
/// apply identity AND ownership as one conditional step inside the backend.
/// Reading the task, checking its owner and then writing is not allowed.
///
/// # Implementations
///
/// - [`postgres::PgStore`]: PostgreSQL via `sqlx`, parameterized queries only
/// - [`memory::MemoryStore`]: in-process store for tests and local runs
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskapi_shared::store::{memory::MemoryStore, TaskStore};
///
/// # async fn example() -> Result<(), taskapi_shared::store::StoreError> {
/// let store: Arc<dyn TaskStore> = Arc::new(MemoryStore::new());
/// let tasks = store.list_tasks(1, 0, 10).await?;
/// assert!(tasks.is_empty());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;

use crate::models::{
    task::{CreateTask, Task},
    user::{CreateUser, User},
};

pub mod memory;
pub mod postgres;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No task with this id belongs to the requesting user
    #[error("Task not found")]
    NotFound,

    /// A user with this email already exists
    #[error("Email already registered")]
    DuplicateEmail,

    /// Backend failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for users and their tasks
///
/// Implementations must be safe to call concurrently, including concurrent
/// updates to the same task id.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Creates a user; fails with `DuplicateEmail` if the email is taken
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    /// Looks a user up by email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Persists an already-validated task
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    /// Tasks owned by `user_id`, newest first, skipping `offset` and returning at most `limit`
    async fn list_tasks(&self, user_id: i64, offset: i64, limit: i64) -> StoreResult<Vec<Task>>;

    /// The task if it exists and belongs to `user_id`, otherwise `NotFound`
    async fn get_task(&self, task_id: i64, user_id: i64) -> StoreResult<Task>;

    /// Sets status to done and bumps `modified_at`
    ///
    /// `NotFound` when the task is absent or owned by someone else. Calling it
    /// on a task that is already done succeeds.
    async fn mark_completed(&self, task_id: i64, user_id: i64) -> StoreResult<()>;

    /// Deletes the task iff it belongs to `user_id`
    ///
    /// Returns whether a row was removed; callers treat both outcomes as success.
    async fn delete_task(&self, task_id: i64, user_id: i64) -> StoreResult<bool>;

    /// Checks that the backend is reachable
    async fn health_check(&self) -> StoreResult<()>;
}
