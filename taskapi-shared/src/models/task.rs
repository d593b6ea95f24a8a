/// Task model and database operations
///
/// Every task is owned by exactly one user, fixed at creation. All reads and
/// writes after creation are conditioned on both the task id and the owner in
/// a single statement, so a task belonging to someone else behaves exactly
/// like a task that does not exist.
///
/// # Status
///
/// ```text
/// todo → in progress → done
/// todo ──────────────→ done
/// ```
///
/// `done` is terminal. Marking a task done is idempotent.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     task_name TEXT NOT NULL,
///     task_description TEXT NOT NULL,
///     task_status TEXT NOT NULL,
///     deadline TIMESTAMPTZ NOT NULL,
///     added_by_user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     modified_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::{fmt, str::FromStr};

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "todo")]
    Todo,

    #[serde(rename = "in progress")]
    InProgress,

    #[serde(rename = "done")]
    Done,
}

/// Returned when a status string is not one of the known values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid task status '{0}', it should be any one of todo, in progress, done")]
pub struct InvalidTaskStatus(pub String);

impl TaskStatus {
    /// All statuses in their canonical order
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Canonical lowercase form, as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive parse: "TODO", "In Progress" and "done" are all accepted
impl FromStr for TaskStatus {
    type Err = InvalidTaskStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lowered)
            .ok_or_else(|| InvalidTaskStatus(s.to_string()))
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = InvalidTaskStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Task owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: i64,

    pub task_name: String,

    pub task_description: String,

    #[sqlx(try_from = "String")]
    pub task_status: TaskStatus,

    pub deadline: DateTime<Utc>,

    /// Owning user, immutable after creation
    #[sqlx(rename = "added_by_user_id")]
    pub user_id: i64,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last modified
    pub modified_at: DateTime<Utc>,
}

/// Input for creating a new task
///
/// Callers validate the fields before building this; the store persists it as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTask {
    pub task_name: String,

    pub task_description: String,

    pub task_status: TaskStatus,

    pub deadline: DateTime<Utc>,

    /// Owning user
    pub user_id: i64,
}

impl Task {
    /// Inserts a task, returning it with generated id and timestamps
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (task_name, task_description, task_status, deadline, added_by_user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, task_name, task_description, task_status, deadline,
                      added_by_user_id, created_at, modified_at
            "#,
        )
        .bind(data.task_name)
        .bind(data.task_description)
        .bind(data.task_status.as_str())
        .bind(data.deadline)
        .bind(data.user_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, scoped to its owner
    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, task_name, task_description, task_status, deadline,
                   added_by_user_id, created_at, modified_at
            FROM tasks
            WHERE id = $1 AND added_by_user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists an owner's tasks, newest first
    pub async fn list_by_owner(
        pool: &PgPool,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, task_name, task_description, task_status, deadline,
                   added_by_user_id, created_at, modified_at
            FROM tasks
            WHERE added_by_user_id = $1
            ORDER BY created_at DESC, id DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Marks a task done
    ///
    /// Returns false when no task with this id belongs to `user_id`. A task
    /// that is already done still matches, so repeating the call is harmless.
    pub async fn mark_done(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET task_status = $3,
                modified_at = NOW()
            WHERE id = $1 AND added_by_user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(TaskStatus::Done.as_str())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a task owned by `user_id`
    pub async fn delete_for_owner(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND added_by_user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
