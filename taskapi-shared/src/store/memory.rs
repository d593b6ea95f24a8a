/// In-memory task store
///
/// Keeps users and tasks behind one async mutex. Each operation runs its
/// ownership check and mutation under a single lock acquisition, which gives
/// the same one-step conditional semantics as the SQL statements in
/// [`super::postgres::PgStore`].
///
/// Used by the test suites and for running the API without a database. Task
/// ids can be marked as failing to simulate backend errors.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{StoreError, StoreResult, TaskStore};
use crate::models::{
    task::{CreateTask, Task, TaskStatus},
    user::{CreateUser, User},
};

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    tasks: BTreeMap<i64, Task>,
    next_user_id: i64,
    next_task_id: i64,
    failing_tasks: HashSet<i64>,
}

impl Inner {
    fn check_failure(&self, task_id: i64) -> StoreResult<()> {
        if self.failing_tasks.contains(&task_id) {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }

    fn owned_mut(&mut self, task_id: i64, user_id: i64) -> Option<&mut Task> {
        self.tasks
            .get_mut(&task_id)
            .filter(|task| task.user_id == user_id)
    }
}

/// `TaskStore` kept entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation on `task_id` fail with a backend error
    pub async fn fail_on_task(&self, task_id: i64) {
        self.inner.lock().await.failing_tasks.insert(task_id);
    }

    /// Number of stored tasks across all users
    pub async fn task_count(&self) -> usize {
        self.inner.lock().await.tasks.len()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut inner = self.inner.lock().await;

        if inner.users.iter().any(|u| u.email == data.email) {
            return Err(StoreError::DuplicateEmail);
        }

        inner.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.next_user_id,
            email: data.email,
            password_hash: data.password_hash,
            verified: false,
            first_name: data.first_name,
            last_name: data.last_name,
            created_at: now,
            modified_at: now,
        };
        inner.users.push(user.clone());

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut inner = self.inner.lock().await;

        inner.next_task_id += 1;
        let now = Utc::now();
        let task = Task {
            id: inner.next_task_id,
            task_name: data.task_name,
            task_description: data.task_description,
            task_status: data.task_status,
            deadline: data.deadline,
            user_id: data.user_id,
            created_at: now,
            modified_at: now,
        };
        inner.tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn list_tasks(&self, user_id: i64, offset: i64, limit: i64) -> StoreResult<Vec<Task>> {
        let inner = self.inner.lock().await;

        let mut owned: Vec<&Task> = inner
            .tasks
            .values()
            .filter(|task| task.user_id == user_id)
            .collect();
        owned.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(owned
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn get_task(&self, task_id: i64, user_id: i64) -> StoreResult<Task> {
        let inner = self.inner.lock().await;
        inner.check_failure(task_id)?;

        inner
            .tasks
            .get(&task_id)
            .filter(|task| task.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn mark_completed(&self, task_id: i64, user_id: i64) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.check_failure(task_id)?;

        let task = inner.owned_mut(task_id, user_id).ok_or(StoreError::NotFound)?;
        task.task_status = TaskStatus::Done;
        task.modified_at = Utc::now();

        Ok(())
    }

    async fn delete_task(&self, task_id: i64, user_id: i64) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        inner.check_failure(task_id)?;

        if inner.owned_mut(task_id, user_id).is_none() {
            return Ok(false);
        }
        Ok(inner.tasks.remove(&task_id).is_some())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
