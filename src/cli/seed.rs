//! Seed command: fill the database with sample tasks.

use crate::factory::TaskFactory;
use crate::repository::TaskRepository;
use crate::types::TaskStatus;
use anyhow::{Result, anyhow};
use clap::Args;
use tracing::info;

/// Arguments for the seed command.
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Number of tasks to insert
    #[arg(short = 'n', long, default_value_t = 20)]
    pub count: usize,

    /// Give every seeded task this status (pending, in_progress, completed)
    #[arg(long)]
    pub status: Option<String>,
}

impl SeedArgs {
    /// Parse the `--status` value, if given.
    pub fn status(&self) -> Result<Option<TaskStatus>> {
        self.status
            .as_deref()
            .map(|s| TaskStatus::parse(s).ok_or_else(|| anyhow!("invalid status: {}", s)))
            .transpose()
    }
}

/// Insert sample tasks and return the resulting row count.
pub fn run_seed(args: &SeedArgs, repo: &dyn TaskRepository) -> Result<i64> {
    let mut factory = TaskFactory::new();
    if let Some(status) = args.status()? {
        factory = factory.with_status(status);
    }

    let created = factory.create_many(repo, args.count)?;
    info!("Seeded {} tasks", created.len());

    Ok(repo.count()?)
}
