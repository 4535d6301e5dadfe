//! Integration tests for the database layer.
//!
//! These tests verify the task repository using an in-memory SQLite database.

use chrono::NaiveDate;
use task_api::db::Database;
use task_api::error::StoreError;
use task_api::factory::TaskFactory;
use task_api::repository::{PAGE_SIZE, TaskListQuery, TaskRepository};
use task_api::types::{NewTask, TaskChanges, TaskStatus};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

mod create_tests {
    use super::*;

    #[test]
    fn create_assigns_id_timestamps_and_default_status() {
        let db = setup_db();

        let task = db.create(&NewTask::new("Test Task")).unwrap();

        assert!(task.id > 0);
        assert_eq!(task.title, "Test Task");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.description.is_none());
        assert!(task.due_date.is_none());
        assert!(task.created_at > 0);
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn create_persists_all_fields() {
        let db = setup_db();
        let due = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();

        let task = db
            .create(
                &NewTask::new("Plan sprint")
                    .with_description("Pick the stories")
                    .with_status(TaskStatus::InProgress)
                    .with_due_date(due),
            )
            .unwrap();

        let fetched = db.get(task.id).unwrap();
        assert_eq!(fetched, task);
        assert_eq!(fetched.description.as_deref(), Some("Pick the stories"));
        assert_eq!(fetched.status, TaskStatus::InProgress);
        assert_eq!(fetched.due_date, Some(due));
    }

    #[test]
    fn ids_increase_and_are_not_reused() {
        let db = setup_db();

        let first = db.create(&NewTask::new("one")).unwrap();
        let second = db.create(&NewTask::new("two")).unwrap();
        assert!(second.id > first.id);

        db.delete(second.id).unwrap();
        let third = db.create(&NewTask::new("three")).unwrap();
        assert!(third.id > second.id);
    }

    #[test]
    fn store_rejects_empty_title() {
        let db = setup_db();
        let result = db.create(&NewTask::new(""));
        assert!(matches!(result, Err(StoreError::Database(_))));
        assert_eq!(db.count().unwrap(), 0);
    }
}

mod get_tests {
    use super::*;

    #[test]
    fn get_missing_is_not_found() {
        let db = setup_db();
        assert!(matches!(db.get(42), Err(StoreError::NotFound(42))));
    }
}

mod list_tests {
    use super::*;

    #[test]
    fn list_orders_newest_first() {
        let db = setup_db();
        let created = TaskFactory::new().create_many(&db, 3).unwrap();

        let page = db.list(&TaskListQuery::default()).unwrap();
        let ids: Vec<i64> = page.tasks.iter().map(|t| t.id).collect();
        let mut expected: Vec<i64> = created.iter().map(|t| t.id).collect();
        expected.reverse();

        assert_eq!(ids, expected);
        assert_eq!(page.total, 3);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, PAGE_SIZE);
    }

    #[test]
    fn unaddressable_page_is_empty_with_total() {
        let db = setup_db();
        TaskFactory::new().create_many(&db, 3).unwrap();

        let page = db
            .list(&TaskListQuery::default().with_page(i64::MAX))
            .unwrap();
        assert!(page.tasks.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.page, i64::MAX);

        assert_eq!(db.list(&TaskListQuery::default()).unwrap().tasks.len(), 3);
    }

    #[test]
    fn eleventh_task_lands_on_page_two() {
        let db = setup_db();
        let created = TaskFactory::new().create_many(&db, 11).unwrap();

        let first = db.list(&TaskListQuery::default()).unwrap();
        assert_eq!(first.tasks.len(), 10);
        assert_eq!(first.total, 11);
        assert_eq!(first.last_page(), 2);

        let second = db.list(&TaskListQuery::default().with_page(2)).unwrap();
        assert_eq!(second.tasks.len(), 1);
        assert_eq!(second.tasks[0].id, created[0].id);

        let beyond = db.list(&TaskListQuery::default().with_page(3)).unwrap();
        assert!(beyond.tasks.is_empty());
        assert_eq!(beyond.total, 11);
    }

    #[test]
    fn pages_cover_every_task_exactly_once() {
        let db = setup_db();
        TaskFactory::new().create_many(&db, 25).unwrap();

        let mut seen = Vec::new();
        for page in 1..=3 {
            let result = db.list(&TaskListQuery::default().with_page(page)).unwrap();
            seen.extend(result.tasks.into_iter().map(|t| t.id));
        }

        assert_eq!(seen.len(), 25);
        assert!(seen.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn status_filter_restricts_results() {
        let db = setup_db();
        // Factory cycles pending, in_progress, completed
        TaskFactory::new().create_many(&db, 9).unwrap();

        let completed = db
            .list(&TaskListQuery::default().with_status("completed"))
            .unwrap();
        assert_eq!(completed.total, 3);
        assert!(completed.tasks.iter().all(|t| t.status == TaskStatus::Completed));
    }

    #[test]
    fn all_sentinel_and_absent_filter_return_everything() {
        let db = setup_db();
        TaskFactory::new().create_many(&db, 5).unwrap();

        assert_eq!(db.list(&TaskListQuery::default()).unwrap().total, 5);
        assert_eq!(
            db.list(&TaskListQuery::default().with_status("all"))
                .unwrap()
                .total,
            5
        );
    }

    #[test]
    fn unknown_status_matches_nothing() {
        let db = setup_db();
        TaskFactory::new().create_many(&db, 4).unwrap();

        let page = db
            .list(&TaskListQuery::default().with_status("archived"))
            .unwrap();
        assert_eq!(page.total, 0);
        assert!(page.tasks.is_empty());
    }
}

mod update_tests {
    use super::*;

    #[test]
    fn update_status_only_keeps_other_fields() {
        let db = setup_db();
        let due = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
        let task = db
            .create(
                &NewTask::new("Keep me")
                    .with_description("unchanged")
                    .with_due_date(due),
            )
            .unwrap();

        let updated = db
            .update(
                task.id,
                &TaskChanges {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.id, task.id);
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.title, "Keep me");
        assert_eq!(updated.description.as_deref(), Some("unchanged"));
        assert_eq!(updated.due_date, Some(due));
        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.updated_at >= task.updated_at);
    }

    #[test]
    fn update_can_clear_nullable_fields() {
        let db = setup_db();
        let task = db
            .create(
                &NewTask::new("Clear me")
                    .with_description("gone soon")
                    .with_due_date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            )
            .unwrap();

        let updated = db
            .update(
                task.id,
                &TaskChanges {
                    description: Some(None),
                    due_date: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(updated.description.is_none());
        assert!(updated.due_date.is_none());
        assert_eq!(updated.title, "Clear me");
    }

    #[test]
    fn empty_update_returns_current_record() {
        let db = setup_db();
        let task = db.create(&NewTask::new("Same")).unwrap();

        let updated = db.update(task.id, &TaskChanges::default()).unwrap();
        assert_eq!(updated, task);
    }

    #[test]
    fn update_missing_is_not_found() {
        let db = setup_db();
        let result = db.update(
            9,
            &TaskChanges {
                title: Some("x".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(StoreError::NotFound(9))));
        assert_eq!(db.count().unwrap(), 0);
    }
}

mod delete_tests {
    use super::*;

    #[test]
    fn delete_removes_row() {
        let db = setup_db();
        let task = db.create(&NewTask::new("Doomed")).unwrap();

        db.delete(task.id).unwrap();

        assert!(matches!(db.get(task.id), Err(StoreError::NotFound(_))));
        assert_eq!(db.count().unwrap(), 0);
    }

    #[test]
    fn repeated_delete_is_not_found() {
        let db = setup_db();
        let task = db.create(&NewTask::new("Once")).unwrap();

        db.delete(task.id).unwrap();
        for _ in 0..3 {
            assert!(matches!(db.delete(task.id), Err(StoreError::NotFound(_))));
        }
    }

    #[test]
    fn delete_leaves_other_rows() {
        let db = setup_db();
        let tasks = TaskFactory::new().create_many(&db, 3).unwrap();

        db.delete(tasks[1].id).unwrap();

        assert_eq!(db.count().unwrap(), 2);
        assert!(db.get(tasks[0].id).is_ok());
        assert!(db.get(tasks[2].id).is_ok());
    }
}

mod file_tests {
    use super::*;

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");

        let id = {
            let db = Database::open(&path).unwrap();
            db.create(&NewTask::new("Persisted")).unwrap().id
        };

        let db = Database::open(&path).unwrap();
        assert_eq!(db.get(id).unwrap().title, "Persisted");
    }
}
