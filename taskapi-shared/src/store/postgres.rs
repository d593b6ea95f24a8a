/// PostgreSQL task store
///
/// Thin adapter from [`TaskStore`] to the model queries. Ownership is part of
/// each statement's `WHERE` clause, so PostgreSQL's per-row atomicity is what
/// keeps concurrent updates from the same owner correct.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{StoreError, StoreResult, TaskStore};
use crate::{
    db::pool::health_check,
    models::{
        task::{CreateTask, Task},
        user::{CreateUser, User},
    },
};

/// `TaskStore` backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data).await.map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateEmail
            }
            other => StoreError::Database(other),
        })
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn list_tasks(&self, user_id: i64, offset: i64, limit: i64) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_owner(&self.pool, user_id, offset, limit).await?)
    }

    async fn get_task(&self, task_id: i64, user_id: i64) -> StoreResult<Task> {
        Task::find_by_id_and_owner(&self.pool, task_id, user_id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn mark_completed(&self, task_id: i64, user_id: i64) -> StoreResult<()> {
        if Task::mark_done(&self.pool, task_id, user_id).await? {
            Ok(())
        } else {
            debug!(task_id, user_id, "mark_completed matched no row");
            Err(StoreError::NotFound)
        }
    }

    async fn delete_task(&self, task_id: i64, user_id: i64) -> StoreResult<bool> {
        Ok(Task::delete_for_owner(&self.pool, task_id, user_id).await?)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}
