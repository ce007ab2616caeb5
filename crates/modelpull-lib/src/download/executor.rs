use super::confirm::Confirm;
use super::transport::{TransferError, Transport};
use super::types::{ExecuteOptions, ExecutionReport, RunState, TaskOutcome, TaskReport};
use crate::error::ModelPullError;
use crate::plan::DownloadTask;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Longest delay between two attempts on the same file.
const MAX_BACKOFF_SHIFT: u32 = 6;

pub struct DownloadExecutor {
    transport: Arc<dyn Transport>,
    options: ExecuteOptions,
    cancel: CancellationToken,
}

impl DownloadExecutor {
    pub fn new(transport: Arc<dyn Transport>, options: ExecuteOptions) -> Self {
        Self {
            transport,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Stops scheduling and drops in-flight transfers once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn execute(
        &self,
        destination_root: &Path,
        tasks: Vec<DownloadTask>,
        confirm: &dyn Confirm,
    ) -> Result<ExecutionReport, ModelPullError> {
        let mut state = RunState::Init;
        ensure_distinct_destinations(&tasks)?;

        if let Err(err) = prepare_destination(destination_root) {
            transition(&mut state, RunState::Aborted);
            return Err(err);
        }
        transition(&mut state, RunState::DirectoryReady);

        let pending = tasks.iter().filter(|task| !task.skip).count();
        if !confirm.confirm(destination_root, pending) {
            transition(&mut state, RunState::Aborted);
            info!("Canceled, nothing was downloaded");
            return Err(ModelPullError::UserAbort {
                destination: destination_root.to_path_buf(),
            });
        }
        transition(&mut state, RunState::Confirmed);

        transition(&mut state, RunState::Running);
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.options.parallelism.max(1)));
        let mut futs = FuturesUnordered::new();
        for (index, task) in tasks.iter().enumerate() {
            let semaphore = semaphore.clone();
            futs.push(async move {
                if task.skip {
                    info!(path = %task.path, "Skip {} because it exists", task.path);
                    return (index, TaskOutcome::Skipped);
                }

                let outcome = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => TaskOutcome::Cancelled,
                    outcome = async {
                        let Ok(_permit) = semaphore.acquire_owned().await else {
                            return TaskOutcome::Cancelled;
                        };
                        self.transfer_with_retries(task).await
                    } => outcome,
                };
                (index, outcome)
            });
        }

        let mut outcomes: Vec<Option<TaskOutcome>> = tasks.iter().map(|_| None).collect();
        while let Some((index, outcome)) = futs.next().await {
            if let TaskOutcome::Failed { error, attempts } = &outcome {
                warn!(path = %tasks[index].path, attempts, "Download failed: {:#}", error);
            }
            outcomes[index] = Some(outcome);
        }
        drop(futs);

        let report = ExecutionReport {
            destination_root: destination_root.to_path_buf(),
            tasks: tasks
                .into_iter()
                .zip(outcomes)
                .map(|(task, outcome)| TaskReport {
                    task,
                    outcome: outcome.unwrap_or(TaskOutcome::Cancelled),
                })
                .collect(),
        };
        transition(&mut state, RunState::Done);

        info!(
            transferred = report.transferred(),
            skipped = report.skipped(),
            failed = report.failed(),
            cancelled = report.cancelled(),
            "Downloads finished"
        );
        Ok(report)
    }

    async fn transfer_with_retries(&self, task: &DownloadTask) -> TaskOutcome {
        if let Some(parent) = task.destination_path.parent()
            && let Err(source) = tokio::fs::create_dir_all(parent).await
        {
            return TaskOutcome::Failed {
                error: TransferError::Io {
                    path: parent.to_path_buf(),
                    source,
                },
                attempts: 0,
            };
        }

        if !task.resume
            && let Err(source) = discard_existing(&task.destination_path).await
        {
            return TaskOutcome::Failed {
                error: TransferError::Io {
                    path: task.destination_path.clone(),
                    source,
                },
                attempts: 0,
            };
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            info!(path = %task.path, url = %task.url, output = %task.destination_path.display(), attempt = attempts, "Downloading");

            match self
                .transport
                .fetch_with_resume(&task.url, &task.destination_path)
                .await
            {
                Ok(report) => {
                    info!(
                        path = %task.path,
                        bytes = report.bytes_written,
                        resumed = report.resumed,
                        "Downloaded"
                    );
                    return TaskOutcome::Transferred {
                        bytes_written: report.bytes_written,
                        resumed: report.resumed,
                        attempts,
                    };
                }
                Err(error) if error.is_retryable() && attempts <= self.options.max_retries => {
                    let shift = (attempts as u32 - 1).min(MAX_BACKOFF_SHIFT);
                    let delay = self.options.retry_backoff.saturating_mul(1 << shift);
                    warn!(path = %task.path, attempt = attempts, "Transfer interrupted, resuming in {:?}: {:#}", delay, error);
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return TaskOutcome::Failed { error, attempts },
            }
        }
    }
}

/// Removes a previous copy so the next transfer starts from offset 0.
async fn discard_existing(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(output = %path.display(), "Discarded existing copy, fetching from scratch");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn transition(state: &mut RunState, next: RunState) {
    tracing::debug!(from = ?state, to = ?next, "Download run state");
    *state = next;
}

/// Each destination file belongs to exactly one task.
fn ensure_distinct_destinations(tasks: &[DownloadTask]) -> Result<(), ModelPullError> {
    let mut seen = HashSet::new();
    for task in tasks {
        if !seen.insert(task.destination_path.as_path()) {
            return Err(ModelPullError::DuplicateDestination {
                path: task.destination_path.clone(),
            });
        }
    }
    Ok(())
}

fn prepare_destination(destination_root: &Path) -> Result<(), ModelPullError> {
    if destination_root.exists() {
        warn!(
            "Folder {} already exists, continuing will resume and overwrite files in it",
            destination_root.display()
        );
    }

    std::fs::create_dir_all(destination_root).map_err(|e| ModelPullError::DirectoryCreation {
        path: destination_root.to_path_buf(),
        reason: e.to_string(),
    })
}
