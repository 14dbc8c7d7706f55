//! The driver sequences the whole pipeline — validate, materialize,
//! install, run, report — and guarantees exactly-once termination
//! reporting even on unexpected failures.

use crate::blob::BlobClient;
use crate::config::TaskSpec;
use crate::error::{error_chain, WorkerError};
use crate::materialize::materialize;
use crate::report::Reporter;
use crate::runner::Runner;
use crate::workdir::WorkDir;

pub struct Driver {
    workdir: WorkDir,
    reporter: Reporter,
    runner: Runner,
    blob: BlobClient,
}

impl Driver {
    pub fn new(workdir: WorkDir, reporter: Reporter, runner: Runner) -> Result<Self, WorkerError> {
        Ok(Self {
            workdir,
            reporter,
            runner,
            blob: BlobClient::new()?,
        })
    }

    /// Run one task from the process environment. Returns the process
    /// exit code: 0 on full success, 1 on any handled failure.
    pub async fn run(&self) -> i32 {
        self.run_with(TaskSpec::from_env()).await
    }

    /// Same as [`Driver::run`], with the spec construction result
    /// injected so tests can feed synthetic variable sources.
    pub async fn run_with(&self, spec: Result<TaskSpec, WorkerError>) -> i32 {
        match self.execute(spec).await {
            Ok(()) => {
                tracing::info!("task completed");
                0
            }
            Err(err) => {
                let trace = error_chain(&err);
                // Full detail always lands on the worker's own stderr
                // for local debugging; the record is the structured
                // signal for the supervisor. The reporter's guard
                // keeps an existing run_task record authoritative.
                eprintln!("{trace}");
                if let Err(report_err) = self
                    .reporter
                    .report_worker_failure(&self.workdir, &err.to_string(), &trace)
                    .await
                {
                    tracing::error!(
                        error.kind = "report.write_failed",
                        error.message = %report_err,
                        "failed to persist termination record"
                    );
                }
                1
            }
        }
    }

    async fn execute(&self, spec: Result<TaskSpec, WorkerError>) -> Result<(), WorkerError> {
        let spec = spec?;
        tracing::info!(
            predecessors = spec.predecessor_outputs.len(),
            "task spec validated"
        );

        materialize(&spec, &self.blob, &self.workdir).await?;
        self.runner.install_dependencies(&self.workdir).await?;

        let result = self.runner.run_task(&self.workdir).await?;
        if result.exit_code != 0 {
            // The detailed record goes in first; the error below only
            // signals the failure upward. No output upload happens.
            self.reporter.report_run_task_failure(&result).await?;
            return Err(WorkerError::TaskFailed {
                exit_code: result.exit_code,
            });
        }

        self.reporter
            .publish_success(&self.workdir, &self.blob, &spec.output_url)
            .await
    }
}
