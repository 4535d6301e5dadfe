//! Task CRUD and listing queries.

use super::{Database, now_ms};
use crate::error::{StoreError, StoreResult};
use crate::repository::{TaskListQuery, TaskPage, TaskRepository};
use crate::types::{NewTask, Task, TaskChanges, TaskStatus};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params};
use tracing::{debug, info};

const TASK_COLUMNS: &str = "id, title, description, status, due_date, created_at, updated_at";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let status = TaskStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("unknown task status: {}", status).into(),
        )
    })?;

    let due_date: Option<String> = row.get("due_date")?;
    let due_date = due_date
        .map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        due_date,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn fetch_task(conn: &Connection, id: i64) -> StoreResult<Task> {
    conn.query_row(
        &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
        params![id],
        parse_task_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound(id))
}

impl Database {
    /// List tasks newest first, optionally filtered by status.
    pub fn list_tasks(&self, query: &TaskListQuery) -> StoreResult<TaskPage> {
        let offset = query.offset();

        self.with_conn(|conn| {
            let mut where_clause = String::new();
            let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(status) = query.status_filter() {
                where_clause.push_str(" WHERE status = ?1");
                params_vec.push(Box::new(status.to_string()));
            }

            let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM tasks{}", where_clause),
                params_refs.as_slice(),
                |row| row.get(0),
            )?;

            // An offset past i64 cannot address any row
            let tasks = match offset {
                Some(offset) => {
                    let sql = format!(
                        "SELECT {} FROM tasks{} ORDER BY id DESC LIMIT {} OFFSET {}",
                        TASK_COLUMNS, where_clause, query.per_page, offset
                    );
                    debug!(sql = %sql, "Listing tasks");

                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map(params_refs.as_slice(), parse_task_row)?
                        .collect::<Result<Vec<_>, _>>()?
                }
                None => Vec::new(),
            };

            Ok(TaskPage {
                tasks,
                total,
                page: query.page.max(1),
                per_page: query.per_page,
            })
        })
    }

    /// Insert a task. Omitting `status` leaves the column to its default.
    pub fn create_task(&self, task: &NewTask) -> StoreResult<Task> {
        self.with_conn(|conn| {
            let now = now_ms();
            let due_date = task.due_date.as_ref().map(format_date);

            match task.status {
                Some(status) => conn.execute(
                    "INSERT INTO tasks
                        (title, description, status, due_date, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![
                        task.title,
                        task.description,
                        status.as_str(),
                        due_date,
                        now
                    ],
                )?,
                None => conn.execute(
                    "INSERT INTO tasks (title, description, due_date, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?4)",
                    params![task.title, task.description, due_date, now],
                )?,
            };

            let id = conn.last_insert_rowid();
            info!(task_id = id, "Created task");
            fetch_task(conn, id)
        })
    }

    /// Fetch a single task by id.
    pub fn get_task(&self, id: i64) -> StoreResult<Task> {
        self.with_conn(|conn| fetch_task(conn, id))
    }

    /// Write the supplied fields of `changes` to an existing task.
    pub fn update_task(&self, id: i64, changes: &TaskChanges) -> StoreResult<Task> {
        self.with_conn(|conn| {
            let existing = fetch_task(conn, id)?;
            if changes.is_empty() {
                return Ok(existing);
            }

            let mut sets: Vec<String> = Vec::new();
            let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

            let mut push = |column: &str, value: Box<dyn ToSql>| {
                params_vec.push(value);
                sets.push(format!("{} = ?{}", column, params_vec.len()));
            };

            if let Some(title) = &changes.title {
                push("title", Box::new(title.clone()));
            }
            if let Some(description) = &changes.description {
                push("description", Box::new(description.clone()));
            }
            if let Some(status) = changes.status {
                push("status", Box::new(status.as_str()));
            }
            if let Some(due_date) = &changes.due_date {
                push("due_date", Box::new(due_date.as_ref().map(format_date)));
            }
            push("updated_at", Box::new(now_ms()));

            params_vec.push(Box::new(id));
            let sql = format!(
                "UPDATE tasks SET {} WHERE id = ?{}",
                sets.join(", "),
                params_vec.len()
            );

            let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
            conn.execute(&sql, params_refs.as_slice())?;

            info!(task_id = id, fields = ?changes.field_names(), "Updated task");
            fetch_task(conn, id)
        })
    }

    /// Permanently remove a task.
    pub fn delete_task(&self, id: i64) -> StoreResult<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            if deleted == 0 {
                return Err(StoreError::NotFound(id));
            }
            info!(task_id = id, "Deleted task");
            Ok(())
        })
    }

    /// Count all stored tasks.
    pub fn count_tasks(&self) -> StoreResult<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
            Ok(count)
        })
    }
}

impl TaskRepository for Database {
    fn list(&self, query: &TaskListQuery) -> StoreResult<TaskPage> {
        self.list_tasks(query)
    }

    fn create(&self, task: &NewTask) -> StoreResult<Task> {
        self.create_task(task)
    }

    fn get(&self, id: i64) -> StoreResult<Task> {
        self.get_task(id)
    }

    fn update(&self, id: i64, changes: &TaskChanges) -> StoreResult<Task> {
        self.update_task(id, changes)
    }

    fn delete(&self, id: i64) -> StoreResult<()> {
        self.delete_task(id)
    }

    fn count(&self) -> StoreResult<i64> {
        self.count_tasks()
    }
}
