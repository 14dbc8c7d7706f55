//! Input materialization: resolve a task's declared inputs into the
//! working directory before anything executes.

use crate::blob::BlobClient;
use crate::config::TaskSpec;
use crate::error::WorkerError;
use crate::workdir::WorkDir;

/// Fetch every declared input and write it under the working
/// directory: one file per predecessor output (named through the arg
/// map), the user code as `task.py`, the dependency manifest as
/// `requirements.txt`. Existing files are overwritten.
pub async fn materialize(
    spec: &TaskSpec,
    blob: &BlobClient,
    workdir: &WorkDir,
) -> Result<(), WorkerError> {
    workdir.ensure().await?;

    for (task_id, url) in &spec.predecessor_outputs {
        let name = spec
            .arg_name_map
            .get(task_id)
            .ok_or_else(|| WorkerError::MissingMapping {
                task_id: task_id.clone(),
            })?;
        let bytes = blob.fetch(url, "predecessor output").await?;
        tokio::fs::write(workdir.input_path(name), &bytes).await?;
        tracing::debug!(task_id = %task_id, file = %name, bytes = bytes.len(), "materialized predecessor output");
    }

    let code = blob.fetch(&spec.code_url, "code").await?;
    tokio::fs::write(workdir.code_path(), &code).await?;

    let manifest = blob.fetch(&spec.requirements_url, "requirements").await?;
    tokio::fs::write(workdir.requirements_path(), &manifest).await?;

    tracing::info!(
        predecessors = spec.predecessor_outputs.len(),
        "inputs materialized"
    );
    Ok(())
}
