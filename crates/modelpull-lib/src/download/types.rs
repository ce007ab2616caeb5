use super::transport::TransferError;
use crate::config::DownloadConfig;
use crate::error::ModelPullError;
use crate::plan::DownloadTask;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Number of transfers in flight at once; 1 downloads strictly in order
    pub parallelism: usize,
    /// Additional attempts per file after the first failure
    pub max_retries: usize,
    /// Delay before the first retry, doubled on every further one
    pub retry_backoff: Duration,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self::from(&DownloadConfig::default())
    }
}

impl From<&DownloadConfig> for ExecuteOptions {
    fn from(config: &DownloadConfig) -> Self {
        Self {
            parallelism: config.parallelism,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

/// Lifecycle of a single executor run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Init,
    DirectoryReady,
    Confirmed,
    Running,
    Done,
    Aborted,
}

#[derive(Debug)]
pub enum TaskOutcome {
    Skipped,
    Transferred {
        bytes_written: u64,
        resumed: bool,
        attempts: usize,
    },
    Failed {
        error: TransferError,
        attempts: usize,
    },
    /// Stopped before completion; any partial file is left for the next run
    Cancelled,
}

impl TaskOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskOutcome::Skipped | TaskOutcome::Transferred { .. })
    }
}

#[derive(Debug)]
pub struct TaskReport {
    pub task: DownloadTask,
    pub outcome: TaskOutcome,
}

#[derive(Debug)]
pub struct ExecutionReport {
    pub destination_root: PathBuf,
    /// One entry per task, in plan order
    pub tasks: Vec<TaskReport>,
}

impl ExecutionReport {
    pub fn transferred(&self) -> usize {
        self.count(|outcome| matches!(outcome, TaskOutcome::Transferred { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, TaskOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, TaskOutcome::Failed { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|outcome| matches!(outcome, TaskOutcome::Cancelled))
    }

    pub fn is_success(&self) -> bool {
        self.tasks.iter().all(|report| report.outcome.is_complete())
    }

    /// Fails with [`ModelPullError::TransfersFailed`] unless every task completed.
    pub fn into_result(self) -> Result<Self, ModelPullError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ModelPullError::TransfersFailed {
                failed: self.failed() + self.cancelled(),
                total: self.tasks.len(),
            })
        }
    }

    fn count(&self, predicate: impl Fn(&TaskOutcome) -> bool) -> usize {
        self.tasks
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}
