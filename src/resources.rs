//! External JSON representation of tasks.
//!
//! [`TaskResource`] is the wire shape of a single task. [`TaskCollection`]
//! wraps a [`TaskPage`] with navigation links and pagination metadata.

use crate::repository::TaskPage;
use crate::types::{Task, TaskStatus};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;

/// Render a millisecond timestamp as ISO-8601 UTC with microseconds.
pub fn format_timestamp(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// A task as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResource {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(with = "date_format")]
    pub due_date: Option<NaiveDate>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<&Task> for TaskResource {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            due_date: task.due_date,
            created_at: format_timestamp(task.created_at),
            updated_at: format_timestamp(task.updated_at),
        }
    }
}

impl From<Task> for TaskResource {
    fn from(task: Task) -> Self {
        Self::from(&task)
    }
}

mod date_format {
    use chrono::NaiveDate;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
            None => serializer.serialize_none(),
        }
    }
}

/// Navigation links for a paginated collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// Pagination metadata for a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMeta {
    pub current_page: i64,
    /// 1-based position of the first item on the page.
    pub from: Option<i64>,
    pub last_page: i64,
    pub path: String,
    pub per_page: i64,
    /// 1-based position of the last item on the page.
    pub to: Option<i64>,
    pub total: i64,
}

/// Paginated list of task resources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskCollection {
    pub data: Vec<TaskResource>,
    pub links: PageLinks,
    pub meta: PageMeta,
}

impl TaskCollection {
    /// Wrap a page. `status` is the filter the client supplied and is
    /// repeated in the navigation links.
    pub fn from_page(page: &TaskPage, path: &str, status: Option<&str>) -> Self {
        let last_page = page.last_page();
        let current = page.page;

        let url = |n: i64| match status {
            Some(status) => format!(
                "{}?status={}&page={}",
                path,
                urlencoding::encode(status),
                n
            ),
            None => format!("{}?page={}", path, n),
        };

        let from = (current - 1)
            .checked_mul(page.per_page)
            .and_then(|n| n.checked_add(1))
            .filter(|_| !page.tasks.is_empty());
        let to = from.and_then(|from| from.checked_add(page.tasks.len() as i64 - 1));

        Self {
            data: page.tasks.iter().map(TaskResource::from).collect(),
            links: PageLinks {
                first: url(1),
                last: url(last_page),
                prev: (current > 1).then(|| url(current - 1)),
                next: (current < last_page).then(|| url(current + 1)),
            },
            meta: PageMeta {
                current_page: current,
                from,
                last_page,
                path: path.to_string(),
                per_page: page.per_page,
                to,
                total: page.total,
            },
        }
    }
}
