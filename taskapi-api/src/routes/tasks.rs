/// Task endpoints
///
/// Every handler here runs behind the JWT layer and takes the owner from the
/// request's `AuthContext`. A task belonging to another user is treated
/// exactly like a task that does not exist.
///
/// # Endpoints
///
/// - `POST   /api/v1/task/add/` - Create a task
/// - `GET    /api/v1/task/list/?offset=&limit=` - List own tasks, newest first
/// - `GET    /api/v1/task/detail/:task_id` - One task
/// - `POST   /api/v1/task/:task_id/mark-done/` - Mark one task done
/// - `DELETE /api/v1/task/:task_id/remove/` - Delete a task
/// - `POST   /api/v1/task/mark-done-bulk/` - Mark many tasks done

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskapi_shared::{
    auth::middleware::AuthContext,
    bulk,
    models::task::{CreateTask, Task, TaskStatus},
    store::StoreError,
};
use tracing::{debug, info};
use validator::Validate;

/// Page size when none is given
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Largest page a client may ask for
pub const MAX_LIST_LIMIT: i64 = 100;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct AddTaskRequest {
    #[validate(length(min = 1, message = "task_name is required"))]
    pub task_name: String,

    #[validate(length(min = 1, message = "task_description is required"))]
    pub task_description: String,

    /// One of "todo", "in progress", "done", in any case
    pub task_status: String,

    pub deadline: DateTime<Utc>,
}

/// Pagination query
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl ListQuery {
    /// Offset and limit with defaults applied and limit capped
    pub fn window(&self) -> (i64, i64) {
        let offset = self.offset.unwrap_or(0).max(0);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        (offset, limit)
    }
}

/// Bulk completion request
#[derive(Debug, Deserialize)]
pub struct BulkMarkDoneRequest {
    pub task_ids: Vec<i64>,
}

/// Plain acknowledgment
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Creates a task owned by the caller
///
/// # Errors
///
/// - `422 Unprocessable Entity`: empty name or description, unknown status
pub async fn add_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<AddTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;
    let task_status: TaskStatus = req.task_status.parse()?;

    let task = state
        .store
        .create_task(CreateTask {
            task_name: req.task_name,
            task_description: req.task_description,
            task_status,
            deadline: req.deadline,
            user_id: auth.user_id(),
        })
        .await?;

    info!(task_id = task.id, user_id = auth.user_id(), "Created task");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Lists the caller's tasks, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let (offset, limit) = query.window();
    let tasks = state.store.list_tasks(auth.user_id(), offset, limit).await?;

    Ok(Json(tasks))
}

/// # Errors
///
/// - `404 Not Found`: no such task for this user
pub async fn task_detail(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Task>> {
    let task = state.store.get_task(task_id, auth.user_id()).await?;

    Ok(Json(task))
}

/// Marks one task done; repeating the call is harmless
///
/// Like removal, an unknown or foreign id is acknowledged as a no-op.
/// Only backend failures are reported.
pub async fn mark_done(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<SuccessResponse>> {
    match state.store.mark_completed(task_id, auth.user_id()).await {
        Ok(()) => {}
        Err(StoreError::NotFound) => {
            debug!(task_id, user_id = auth.user_id(), "Mark done matched no task");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(SuccessResponse::ok())
}

/// Deletes a task
///
/// Answers 204 whether or not anything was removed, so the response never
/// reveals whether someone else's task exists.
pub async fn remove_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let removed = state.store.delete_task(task_id, auth.user_id()).await?;
    debug!(task_id, user_id = auth.user_id(), removed, "Remove task");

    Ok(StatusCode::NO_CONTENT)
}

/// Marks every listed task done, concurrently
///
/// Always acknowledges once every id has been attempted. Ids that are
/// unknown, foreign or fail in the store are only logged.
pub async fn mark_done_bulk(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<BulkMarkDoneRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    bulk::mark_done_bulk(state.store.clone(), auth.user_id(), &req.task_ids).await;

    Ok(SuccessResponse::ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_window_defaults() {
        assert_eq!(ListQuery::default().window(), (0, DEFAULT_LIST_LIMIT));
    }

    #[test]
    fn test_list_window_clamps() {
        let query = ListQuery {
            offset: Some(-5),
            limit: Some(1_000),
        };
        assert_eq!(query.window(), (0, MAX_LIST_LIMIT));

        let query = ListQuery {
            offset: Some(20),
            limit: Some(0),
        };
        assert_eq!(query.window(), (20, 1));
    }
}
