/// Bulk mutation orchestrator
///
/// Applies "mark done" to many task ids for one owner. Each id gets its own
/// tokio task; all of them run concurrently and the call returns only after
/// every one has finished. A failure for one id never cancels or affects the
/// others, it is logged and recorded in the report.
///
/// The HTTP layer answers with a flat acknowledgment, while the
/// [`BulkCompletionReport`] keeps the per-id outcome for logging and tests.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskapi_shared::bulk::mark_done_bulk;
/// use taskapi_shared::store::{memory::MemoryStore, TaskStore};
///
/// # async fn example() {
/// let store: Arc<dyn TaskStore> = Arc::new(MemoryStore::new());
/// let report = mark_done_bulk(store, 1, &[10, 11, 10]).await;
/// assert_eq!(report.len(), 3);
/// # }
/// ```

use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::store::{StoreError, TaskStore};

/// What happened to a single id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkItemOutcome {
    /// Task is now done
    Completed,

    /// No such task for this owner
    NotFound,

    /// Backend error, or the unit of work panicked
    Failed(String),
}

/// Outcome for one requested id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemResult {
    pub task_id: i64,
    pub outcome: BulkItemOutcome,
}

/// Per-id outcomes, in request order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkCompletionReport {
    pub items: Vec<BulkItemResult>,
}

impl BulkCompletionReport {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of ids that ended up completed
    pub fn completed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.outcome == BulkItemOutcome::Completed)
            .count()
    }

    /// Ids that were not completed, for any reason
    pub fn failed_ids(&self) -> Vec<i64> {
        self.items
            .iter()
            .filter(|item| item.outcome != BulkItemOutcome::Completed)
            .map(|item| item.task_id)
            .collect()
    }
}

/// Marks every id in `task_ids` done for `user_id`, concurrently
///
/// Duplicated ids are each attempted; completion is idempotent so the end
/// state is the same.
pub async fn mark_done_bulk(
    store: Arc<dyn TaskStore>,
    user_id: i64,
    task_ids: &[i64],
) -> BulkCompletionReport {
    let handles: Vec<_> = task_ids
        .iter()
        .map(|&task_id| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.mark_completed(task_id, user_id).await })
        })
        .collect();

    let joined = join_all(handles).await;

    let items: Vec<BulkItemResult> = task_ids
        .iter()
        .zip(joined)
        .map(|(&task_id, result)| {
            let outcome = match result {
                Ok(Ok(())) => BulkItemOutcome::Completed,
                Ok(Err(StoreError::NotFound)) => {
                    warn!(task_id, user_id, "Bulk completion skipped unknown task");
                    BulkItemOutcome::NotFound
                }
                Ok(Err(e)) => {
                    warn!(task_id, user_id, error = %e, "Bulk completion failed for task");
                    BulkItemOutcome::Failed(e.to_string())
                }
                Err(e) => {
                    error!(task_id, user_id, error = %e, "Bulk completion unit did not finish");
                    BulkItemOutcome::Failed(e.to_string())
                }
            };
            BulkItemResult { task_id, outcome }
        })
        .collect();

    let report = BulkCompletionReport { items };

    info!(
        user_id,
        requested = report.len(),
        completed = report.completed_count(),
        "Bulk completion finished"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        task::{CreateTask, Task, TaskStatus},
        user::{CreateUser, User},
    };
    use crate::store::{memory::MemoryStore, StoreResult};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn new_task(user_id: i64, name: &str) -> CreateTask {
        CreateTask {
            task_name: name.to_string(),
            task_description: "desc".to_string(),
            task_status: TaskStatus::Todo,
            deadline: Utc::now() + Duration::days(1),
            user_id,
        }
    }

    async fn seeded(store: &MemoryStore, user_id: i64, count: usize) -> Vec<i64> {
        let mut ids = Vec::new();
        for i in 0..count {
            let task = store
                .create_task(new_task(user_id, &format!("task {}", i)))
                .await
                .unwrap();
            ids.push(task.id);
        }
        ids
    }

    #[tokio::test]
    async fn test_partial_failures_do_not_block_valid_ids() {
        let store = Arc::new(MemoryStore::new());
        let mine = seeded(&store, 1, 3).await;
        let theirs = seeded(&store, 2, 1).await;
        store.fail_on_task(mine[2]).await;

        let requested = vec![mine[0], 999_999, theirs[0], mine[1], mine[2]];
        let report = mark_done_bulk(store.clone(), 1, &requested).await;

        assert_eq!(report.len(), 5);
        assert_eq!(report.completed_count(), 2);
        assert_eq!(report.failed_ids(), vec![999_999, theirs[0], mine[2]]);
        assert!(matches!(report.items[4].outcome, BulkItemOutcome::Failed(_)));
        assert_eq!(report.items[1].outcome, BulkItemOutcome::NotFound);

        for id in [mine[0], mine[1]] {
            let task = store.get_task(id, 1).await.unwrap();
            assert_eq!(task.task_status, TaskStatus::Done);
        }
        let other = store.get_task(theirs[0], 2).await.unwrap();
        assert_eq!(other.task_status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn test_duplicates_are_each_attempted() {
        let store = Arc::new(MemoryStore::new());
        let ids = seeded(&store, 1, 1).await;

        let report = mark_done_bulk(store.clone(), 1, &[ids[0], ids[0], ids[0]]).await;

        assert_eq!(report.len(), 3);
        assert_eq!(report.completed_count(), 3);
        let task = store.get_task(ids[0], 1).await.unwrap();
        assert_eq!(task.task_status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn test_empty_request() {
        let store = Arc::new(MemoryStore::new());
        let report = mark_done_bulk(store, 1, &[]).await;

        assert!(report.is_empty());
        assert!(report.failed_ids().is_empty());
    }

    /// Delays completion and tracks how many completions overlap
    struct SlowStore {
        inner: MemoryStore,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TaskStore for SlowStore {
        async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
            self.inner.create_user(data).await
        }

        async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
            self.inner.find_user_by_email(email).await
        }

        async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
            self.inner.create_task(data).await
        }

        async fn list_tasks(&self, user_id: i64, offset: i64, limit: i64) -> StoreResult<Vec<Task>> {
            self.inner.list_tasks(user_id, offset, limit).await
        }

        async fn get_task(&self, task_id: i64, user_id: i64) -> StoreResult<Task> {
            self.inner.get_task(task_id, user_id).await
        }

        async fn mark_completed(&self, task_id: i64, user_id: i64) -> StoreResult<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.mark_completed(task_id, user_id).await
        }

        async fn delete_task(&self, task_id: i64, user_id: i64) -> StoreResult<bool> {
            self.inner.delete_task(task_id, user_id).await
        }

        async fn health_check(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_units_run_concurrently_and_all_finish() {
        let inner = MemoryStore::new();
        let ids = seeded(&inner, 1, 8).await;
        let store = Arc::new(SlowStore {
            inner,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });

        let report = mark_done_bulk(store.clone(), 1, &ids).await;

        assert_eq!(report.completed_count(), 8);
        assert_eq!(store.in_flight.load(Ordering::SeqCst), 0);
        assert!(store.peak.load(Ordering::SeqCst) > 1);
    }
}
