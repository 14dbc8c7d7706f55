use thiserror::Error;

/// Worker error taxonomy.
///
/// A non-zero task exit is deliberately not an error by itself: the
/// runner returns it as a value inside `RunResult`. It only shows up
/// here as the terminal `TaskFailed` signal after the detailed
/// run_task record has already been persisted.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("missing required inputs: {}", fields.join(","))]
    MissingInput { fields: Vec<String> },

    #[error("invalid task spec: {0}")]
    InvalidSpec(String),

    #[error("missing arg mapping for predecessor: {task_id}")]
    MissingMapping { task_id: String },

    #[error("missing {what} url")]
    InvalidReference { what: &'static str },

    #[error("transfer failed: {op} {url}: {source}")]
    Transport {
        op: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("http client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    #[error("dependency install failed with exit code {exit_code}")]
    DependencyInstall { exit_code: i32 },

    #[error("task failed with exit code {exit_code}")]
    TaskFailed { exit_code: i32 },

    #[error("spawn failed: {0}")]
    Spawn(String),

    #[error("stream io error: {stream}: {source}")]
    StreamIo {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render an error with its full source chain, one cause per line.
/// This is what lands in the `traceback` field of a worker-stage
/// termination record and on the process stderr.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(cause) = cur {
        out.push_str("\ncaused by: ");
        out.push_str(&cause.to_string());
        cur = cause.source();
    }
    out
}
