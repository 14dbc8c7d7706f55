//! Termination records: the single structured outcome written for a
//! failed run, read by an external supervisor after process exit.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::blob::BlobClient;
use crate::error::WorkerError;
use crate::runner::RunResult;
use crate::util::{read_tail, tail_lossy};
use crate::workdir::WorkDir;

/// Bytes of task stdout/stderr kept in a record.
pub const STREAM_TAIL_LIMIT: usize = 2000;
/// Bytes of the error trace kept in a worker-stage record.
pub const TRACE_TAIL_LIMIT: usize = 3000;

/// The durable diagnostic for a failed run.
///
/// At most one record is persisted per process. A `run_task` record is
/// the authoritative failure and is never overwritten by a later
/// worker-stage report; on success no record exists at all.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum TerminationRecord {
    RunTask {
        exit_code: i32,
        stdout_tail: String,
        stderr_tail: String,
    },
    Worker {
        error: String,
        traceback: String,
        task_stdout_tail: String,
        task_stderr_tail: String,
    },
}

pub struct Reporter {
    path: PathBuf,
}

impl Reporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a non-zero task exit. This is the first and
    /// authoritative failure for the task; any prior content at the
    /// record path is truncated.
    pub async fn report_run_task_failure(&self, result: &RunResult) -> Result<(), WorkerError> {
        let record = TerminationRecord::RunTask {
            exit_code: result.exit_code,
            stdout_tail: tail_lossy(&result.stdout, STREAM_TAIL_LIMIT),
            stderr_tail: tail_lossy(&result.stderr, STREAM_TAIL_LIMIT),
        };
        tracing::error!(
            error.kind = "task.failed",
            exit_code = result.exit_code,
            "recording run_task failure"
        );
        self.write(&record).await
    }

    /// Record a worker-level failure: the error message, a bounded
    /// trace, and whatever task output exists on disk (the capture
    /// files may not exist if the failure happened before the task
    /// ran). Skipped when a run_task record is already present, since
    /// that one is more specific.
    pub async fn report_worker_failure(
        &self,
        workdir: &WorkDir,
        error: &str,
        trace: &str,
    ) -> Result<(), WorkerError> {
        if matches!(
            self.read_existing().await,
            Some(TerminationRecord::RunTask { .. })
        ) {
            tracing::debug!("run_task record already present, keeping it");
            return Ok(());
        }
        let record = TerminationRecord::Worker {
            error: error.to_string(),
            traceback: tail_lossy(trace.as_bytes(), TRACE_TAIL_LIMIT),
            task_stdout_tail: read_tail(&workdir.task_stdout_path(), STREAM_TAIL_LIMIT).await,
            task_stderr_tail: read_tail(&workdir.task_stderr_path(), STREAM_TAIL_LIMIT).await,
        };
        tracing::error!(error.kind = "worker.failed", error.message = %error, "recording worker failure");
        self.write(&record).await
    }

    /// Push the task's primary output to the upload URL. Only called
    /// after a zero exit; a failure here surfaces as a worker-stage
    /// failure at the driver.
    pub async fn publish_success(
        &self,
        workdir: &WorkDir,
        blob: &BlobClient,
        output_url: &str,
    ) -> Result<(), WorkerError> {
        let output = tokio::fs::read(workdir.task_stdout_path()).await?;
        blob.push(output_url, &output).await?;
        tracing::info!(bytes = output.len(), "output uploaded");
        Ok(())
    }

    async fn write(&self, record: &TerminationRecord) -> Result<(), WorkerError> {
        let json = serde_json::to_string(record)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn read_existing(&self) -> Option<TerminationRecord> {
        let raw = tokio::fs::read_to_string(&self.path).await.ok()?;
        serde_json::from_str(&raw).ok()
    }
}
