//! Task specification, built once from the environment at startup and
//! validated as a unit.

use std::collections::BTreeMap;

use crate::error::WorkerError;

pub const ENV_CODE_URL: &str = "CODE_URL";
pub const ENV_REQ_URL: &str = "REQ_URL";
pub const ENV_PRED_URLS: &str = "PRED_URLS_JSON";
pub const ENV_FUNC_ARG_MAP: &str = "FUNC_ARG_MAP_JSON";
pub const ENV_OUTPUT_URL: &str = "OUTPUT_SIGNED_URL";

pub const REQUIRED_ENVS: [&str; 5] = [
    ENV_CODE_URL,
    ENV_REQ_URL,
    ENV_PRED_URLS,
    ENV_FUNC_ARG_MAP,
    ENV_OUTPUT_URL,
];

/// Read-only description of the one task this worker runs: where to
/// fetch its inputs and where to push its output.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub code_url: String,
    pub requirements_url: String,
    /// Upstream task id -> signed URL of that task's output.
    pub predecessor_outputs: BTreeMap<String, String>,
    /// Upstream task id -> local filename the task expects.
    pub arg_name_map: BTreeMap<String, String>,
    pub output_url: String,
}

impl TaskSpec {
    pub fn from_env() -> Result<Self, WorkerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build and validate a spec from an arbitrary variable source.
    ///
    /// Every missing or empty required variable is collected and
    /// reported in one aggregated error, before any parsing or I/O.
    /// Mapping completeness is checked here too, so a spec that
    /// survives construction cannot fail materialization on a missing
    /// arg name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WorkerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut get = |key: &'static str| -> String {
            match lookup(key) {
                Some(v) if !v.is_empty() => v,
                _ => {
                    missing.push(key.to_string());
                    String::new()
                }
            }
        };

        let code_url = get(ENV_CODE_URL);
        let requirements_url = get(ENV_REQ_URL);
        let pred_urls_raw = get(ENV_PRED_URLS);
        let arg_map_raw = get(ENV_FUNC_ARG_MAP);
        let output_url = get(ENV_OUTPUT_URL);

        if !missing.is_empty() {
            return Err(WorkerError::MissingInput { fields: missing });
        }

        let spec = Self {
            code_url,
            requirements_url,
            predecessor_outputs: parse_string_map(ENV_PRED_URLS, &pred_urls_raw)?,
            arg_name_map: parse_string_map(ENV_FUNC_ARG_MAP, &arg_map_raw)?,
            output_url,
        };
        spec.validate_mappings()?;
        Ok(spec)
    }

    fn validate_mappings(&self) -> Result<(), WorkerError> {
        for task_id in self.predecessor_outputs.keys() {
            if !self.arg_name_map.contains_key(task_id) {
                return Err(WorkerError::MissingMapping {
                    task_id: task_id.clone(),
                });
            }
        }
        Ok(())
    }
}

fn parse_string_map(key: &str, raw: &str) -> Result<BTreeMap<String, String>, WorkerError> {
    serde_json::from_str(raw)
        .map_err(|e| WorkerError::InvalidSpec(format!("{key} is not a JSON object of strings: {e}")))
}
