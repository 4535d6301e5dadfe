//! Deterministic sample-task generator.
//!
//! Used by the `seed` command and by tests that need realistic rows without
//! caring about exact contents.

use crate::error::StoreResult;
use crate::repository::TaskRepository;
use crate::types::{NewTask, Task, TaskStatus};
use chrono::{Days, NaiveDate};

const VERBS: &[&str] = &[
    "Review", "Draft", "Refactor", "Ship", "Document", "Test", "Plan", "Fix",
];

const SUBJECTS: &[&str] = &[
    "the onboarding flow",
    "quarterly report",
    "billing service",
    "release notes",
    "search index",
    "login page",
    "deployment script",
];

/// Produces a reproducible stream of [`NewTask`] values.
///
/// Every field the store allows to be null is filled for some tasks and left
/// empty for others, and statuses cycle through every variant.
#[derive(Debug, Clone, Default)]
pub struct TaskFactory {
    sequence: usize,
    status: Option<TaskStatus>,
}

impl TaskFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force every generated task to the given status.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Produce the next task definition.
    pub fn next_task(&mut self) -> NewTask {
        let n = self.sequence;
        self.sequence += 1;

        let title = format!(
            "{} {} #{}",
            VERBS[n % VERBS.len()],
            SUBJECTS[n % SUBJECTS.len()],
            n + 1
        );

        let description = (n % 2 == 0).then(|| {
            format!(
                "Follow-up item {} generated for {}.",
                n + 1,
                SUBJECTS[(n + 3) % SUBJECTS.len()]
            )
        });

        let status = self
            .status
            .unwrap_or(TaskStatus::ALL[n % TaskStatus::ALL.len()]);

        let due_date = (n % 3 != 0)
            .then(|| NaiveDate::from_ymd_opt(2025, 1, 1))
            .flatten()
            .and_then(|base| base.checked_add_days(Days::new(n as u64)));

        NewTask {
            title,
            description,
            status: Some(status),
            due_date,
        }
    }

    /// Insert the next task through `repo`.
    pub fn create(&mut self, repo: &dyn TaskRepository) -> StoreResult<Task> {
        let task = self.next_task();
        repo.create(&task)
    }

    /// Insert `count` tasks, returning them in insertion order.
    pub fn create_many(
        &mut self,
        repo: &dyn TaskRepository,
        count: usize,
    ) -> StoreResult<Vec<Task>> {
        (0..count).map(|_| self.create(repo)).collect()
    }
}
