//! Sandboxed task execution: the dependency install step and the task
//! subprocess itself.

mod io_pump;

use std::process::Stdio;

use tokio::process::Command;

use crate::error::WorkerError;
use crate::workdir::{WorkDir, CODE_FILENAME, REQUIREMENTS_FILENAME};

/// Program plus arguments for one of the runner's child processes.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Result of one task execution, immutable after creation. A non-zero
/// exit code is a normal, representable outcome here, not an error.
#[derive(Debug)]
pub struct RunResult {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

pub struct Runner {
    install: CommandSpec,
    task: CommandSpec,
    silent: bool,
}

impl Runner {
    /// Runner for the standard python task layout:
    /// `<python> -m pip install -r requirements.txt`, then
    /// `<python> task.py`.
    pub fn for_python(python_bin: &str) -> Self {
        Self::new(
            CommandSpec::new(
                python_bin,
                &["-m", "pip", "install", "-r", REQUIREMENTS_FILENAME],
            ),
            CommandSpec::new(python_bin, &[CODE_FILENAME]),
        )
    }

    pub fn new(install: CommandSpec, task: CommandSpec) -> Self {
        Self {
            install,
            task,
            silent: false,
        }
    }

    /// Suppress forwarding of the child's streams to the parent stdio.
    /// Tests use this to keep their own output clean.
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Install declared dependencies as a separate step before the
    /// task runs. Output goes straight to the parent stdio; a non-zero
    /// exit aborts the pipeline and is never captured as a RunResult.
    pub async fn install_dependencies(&self, workdir: &WorkDir) -> Result<(), WorkerError> {
        tracing::info!(program = %self.install.program, "installing dependencies");
        let status = Command::new(&self.install.program)
            .args(&self.install.args)
            .current_dir(workdir.root())
            .status()
            .await
            .map_err(|e| WorkerError::Spawn(format!("{}: {e}", self.install.program)))?;

        if !status.success() {
            return Err(WorkerError::DependencyInstall {
                exit_code: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }

    /// Run the task to completion, capturing stdout and stderr in full
    /// while forwarding both to the parent's own streams. The captured
    /// bytes are also persisted to `output.txt` / `error.txt` for
    /// later tail extraction and the output upload.
    pub async fn run_task(&self, workdir: &WorkDir) -> Result<RunResult, WorkerError> {
        tracing::info!(program = %self.task.program, "running task");
        let mut child = Command::new(&self.task.program)
            .args(&self.task.args)
            .current_dir(workdir.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| WorkerError::Spawn(format!("{}: {e}", self.task.program)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| WorkerError::Spawn("no stdout".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| WorkerError::Spawn("no stderr".into()))?;

        let out_task = io_pump::pump_stdout(stdout, self.silent);
        let err_task = io_pump::pump_stderr(stderr, self.silent);

        let status = child
            .wait()
            .await
            .map_err(|e| WorkerError::Spawn(e.to_string()))?;
        let stdout = out_task
            .await
            .map_err(|e| WorkerError::Spawn(e.to_string()))??;
        let stderr = err_task
            .await
            .map_err(|e| WorkerError::Spawn(e.to_string()))??;

        tokio::fs::write(workdir.task_stdout_path(), &stdout).await?;
        tokio::fs::write(workdir.task_stderr_path(), &stderr).await?;

        let exit_code = status.code().unwrap_or(-1);
        tracing::info!(
            exit_code,
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            "task finished"
        );
        Ok(RunResult {
            exit_code,
            stdout,
            stderr,
        })
    }
}
