//! Storage-facing interface for task records.

use crate::error::StoreResult;
use crate::types::{NewTask, Task, TaskChanges};

/// Fixed number of tasks per listing page.
pub const PAGE_SIZE: i64 = 10;

/// Status filter value that disables filtering.
pub const ALL_STATUSES: &str = "all";

/// Filter and pagination parameters for [`TaskRepository::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListQuery {
    /// Exact status to match. `None` or [`ALL_STATUSES`] returns every task.
    pub status: Option<String>,
    /// 1-based page number.
    pub page: i64,
    pub per_page: i64,
}

impl Default for TaskListQuery {
    fn default() -> Self {
        Self {
            status: None,
            page: 1,
            per_page: PAGE_SIZE,
        }
    }
}

impl TaskListQuery {
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    /// The status to filter on, if filtering applies.
    pub fn status_filter(&self) -> Option<&str> {
        self.status.as_deref().filter(|s| *s != ALL_STATUSES)
    }

    /// Row offset of the first task on this page, or `None` when the page
    /// lies beyond any addressable row.
    pub fn offset(&self) -> Option<i64> {
        (self.page.max(1) - 1).checked_mul(self.per_page)
    }
}

/// One page of tasks, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    /// Rows matching the filter across all pages.
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl TaskPage {
    pub fn last_page(&self) -> i64 {
        if self.total <= 0 || self.per_page <= 0 {
            1
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }
}

/// Task persistence operations.
///
/// Implementations must fail lookups and mutations of a missing id with
/// [`StoreError::NotFound`](crate::error::StoreError::NotFound) and leave the
/// store unchanged in that case.
pub trait TaskRepository: Send + Sync {
    fn list(&self, query: &TaskListQuery) -> StoreResult<TaskPage>;

    fn create(&self, task: &NewTask) -> StoreResult<Task>;

    fn get(&self, id: i64) -> StoreResult<Task>;

    /// Apply only the supplied fields. An empty change set returns the
    /// current record without writing.
    fn update(&self, id: i64, changes: &TaskChanges) -> StoreResult<Task>;

    fn delete(&self, id: i64) -> StoreResult<()>;

    /// Total number of stored tasks.
    fn count(&self) -> StoreResult<i64>;
}
