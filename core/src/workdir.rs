//! Working-directory context.
//!
//! Every component receives a `WorkDir` instead of reaching for global
//! fixed paths, so tests can inject a temp directory per case. The
//! well-known filenames inside the directory are fixed: they are the
//! contract between the materializer, the runner and the reporter.

use std::path::{Path, PathBuf};

/// The user code, executed as the task entry point.
pub const CODE_FILENAME: &str = "task.py";
/// The dependency manifest consumed by the install step.
pub const REQUIREMENTS_FILENAME: &str = "requirements.txt";
/// Full captured task stdout; also the artifact uploaded on success.
pub const TASK_STDOUT_FILENAME: &str = "output.txt";
/// Full captured task stderr.
pub const TASK_STDERR_FILENAME: &str = "error.txt";

#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    pub fn code_path(&self) -> PathBuf {
        self.root.join(CODE_FILENAME)
    }

    pub fn requirements_path(&self) -> PathBuf {
        self.root.join(REQUIREMENTS_FILENAME)
    }

    pub fn task_stdout_path(&self) -> PathBuf {
        self.root.join(TASK_STDOUT_FILENAME)
    }

    pub fn task_stderr_path(&self) -> PathBuf {
        self.root.join(TASK_STDERR_FILENAME)
    }

    /// Path for a named predecessor input inside the directory.
    pub fn input_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}
