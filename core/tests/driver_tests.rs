//! End-to-end driver scenarios against a mock blob store and shell
//! scripts standing in for the python task.

use std::collections::HashMap;
use std::path::Path;

use pretty_assertions::assert_eq;
use taskrun_core::config::TaskSpec;
use taskrun_core::driver::Driver;
use taskrun_core::error::WorkerError;
use taskrun_core::report::{Reporter, TerminationRecord};
use taskrun_core::runner::{CommandSpec, Runner};
use taskrun_core::workdir::WorkDir;

struct Harness {
    _dir: tempfile::TempDir,
    workdir: WorkDir,
    record_path: std::path::PathBuf,
    driver: Driver,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let workdir = WorkDir::new(dir.path().join("app"));
    let record_path = dir.path().join("termination-log");
    // `sh task.py` runs the materialized code file as a shell script;
    // `true` makes the install step a no-op.
    let runner = Runner::new(
        CommandSpec::new("true", &[]),
        CommandSpec::new("sh", &["task.py"]),
    )
    .silent();
    let driver = Driver::new(
        workdir.clone(),
        Reporter::new(&record_path),
        runner,
    )
    .unwrap();
    Harness {
        _dir: dir,
        workdir,
        record_path,
        driver,
    }
}

fn env_vars(server: &mockito::Server) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert("CODE_URL".into(), format!("{}/code", server.url()));
    vars.insert("REQ_URL".into(), format!("{}/reqs", server.url()));
    vars.insert(
        "PRED_URLS_JSON".into(),
        format!(r#"{{"A":"{}/pred-a"}}"#, server.url()),
    );
    vars.insert("FUNC_ARG_MAP_JSON".into(), r#"{"A":"x.bin"}"#.into());
    vars.insert("OUTPUT_SIGNED_URL".into(), format!("{}/out", server.url()));
    vars
}

fn spec_from(vars: &HashMap<String, String>) -> Result<TaskSpec, WorkerError> {
    TaskSpec::from_lookup(|k| vars.get(k).cloned())
}

async fn read_record(path: &Path) -> TerminationRecord {
    let raw = tokio::fs::read_to_string(path).await.unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn successful_task_uploads_output_and_writes_no_record() {
    let mut server = mockito::Server::new_async().await;
    let _code = server
        .mock("GET", "/code")
        .with_body("cat x.bin\necho hello\n")
        .create_async()
        .await;
    let _reqs = server.mock("GET", "/reqs").with_body("").create_async().await;
    let _pred = server
        .mock("GET", "/pred-a")
        .with_body("PRED-")
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/out")
        .match_body("PRED-hello\n")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let h = harness();
    let exit = h.driver.run_with(spec_from(&env_vars(&server))).await;

    assert_eq!(exit, 0);
    assert!(!h.record_path.exists(), "no termination record on success");
    put.assert_async().await;

    // Predecessor round-trip: x.bin holds exactly the fetched bytes.
    assert_eq!(
        std::fs::read(h.workdir.input_path("x.bin")).unwrap(),
        b"PRED-"
    );
}

#[tokio::test]
async fn missing_environment_yields_one_worker_record_listing_every_field() {
    let h = harness();
    let exit = h.driver.run_with(spec_from(&HashMap::new())).await;

    assert_eq!(exit, 1);
    match read_record(&h.record_path).await {
        TerminationRecord::Worker {
            error,
            task_stdout_tail,
            task_stderr_tail,
            ..
        } => {
            for field in [
                "CODE_URL",
                "REQ_URL",
                "PRED_URLS_JSON",
                "FUNC_ARG_MAP_JSON",
                "OUTPUT_SIGNED_URL",
            ] {
                assert!(error.contains(field), "missing {field} in: {error}");
            }
            // Nothing ran, so no captured output exists.
            assert_eq!(task_stdout_tail, "");
            assert_eq!(task_stderr_tail, "");
        }
        other => panic!("unexpected record: {other:?}"),
    }
}

#[tokio::test]
async fn failing_task_writes_a_run_task_record_and_skips_upload() {
    let mut server = mockito::Server::new_async().await;
    let _code = server
        .mock("GET", "/code")
        .with_body("echo partial out\necho 'ZeroDivisionError: division by zero' >&2\nexit 1\n")
        .create_async()
        .await;
    let _reqs = server.mock("GET", "/reqs").with_body("").create_async().await;
    let _pred = server.mock("GET", "/pred-a").with_body("p").create_async().await;
    let put = server
        .mock("PUT", "/out")
        .expect(0)
        .create_async()
        .await;

    let h = harness();
    let exit = h.driver.run_with(spec_from(&env_vars(&server))).await;

    assert_eq!(exit, 1);
    put.assert_async().await;
    match read_record(&h.record_path).await {
        TerminationRecord::RunTask {
            exit_code,
            stdout_tail,
            stderr_tail,
        } => {
            assert_eq!(exit_code, 1);
            assert_eq!(stdout_tail, "partial out\n");
            assert!(
                stderr_tail.contains("ZeroDivisionError"),
                "stderr tail: {stderr_tail}"
            );
        }
        other => panic!("unexpected record: {other:?}"),
    }
}

#[tokio::test]
async fn run_task_record_survives_the_top_level_catch() {
    // The driver routes the TaskFailed signal through the worker-stage
    // reporter like any other error; the no-clobber guard must keep
    // the run_task record.
    let mut server = mockito::Server::new_async().await;
    let _code = server
        .mock("GET", "/code")
        .with_body("exit 9\n")
        .create_async()
        .await;
    let _reqs = server.mock("GET", "/reqs").with_body("").create_async().await;
    let _pred = server.mock("GET", "/pred-a").with_body("p").create_async().await;

    let h = harness();
    let exit = h.driver.run_with(spec_from(&env_vars(&server))).await;

    assert_eq!(exit, 1);
    assert!(matches!(
        read_record(&h.record_path).await,
        TerminationRecord::RunTask { exit_code: 9, .. }
    ));
}

#[tokio::test]
async fn fetch_failure_becomes_a_worker_record() {
    let mut server = mockito::Server::new_async().await;
    let _pred = server
        .mock("GET", "/pred-a")
        .with_status(503)
        .create_async()
        .await;

    let h = harness();
    let exit = h.driver.run_with(spec_from(&env_vars(&server))).await;

    assert_eq!(exit, 1);
    match read_record(&h.record_path).await {
        TerminationRecord::Worker { error, .. } => {
            assert!(error.contains("transfer failed"), "error: {error}");
        }
        other => panic!("unexpected record: {other:?}"),
    }
}

#[tokio::test]
async fn install_failure_becomes_a_worker_record() {
    let mut server = mockito::Server::new_async().await;
    let _code = server.mock("GET", "/code").with_body("exit 0\n").create_async().await;
    let _reqs = server.mock("GET", "/reqs").with_body("").create_async().await;
    let _pred = server.mock("GET", "/pred-a").with_body("p").create_async().await;

    let dir = tempfile::tempdir().unwrap();
    let workdir = WorkDir::new(dir.path().join("app"));
    let record_path = dir.path().join("termination-log");
    let runner = Runner::new(
        CommandSpec::new("false", &[]),
        CommandSpec::new("sh", &["task.py"]),
    )
    .silent();
    let driver = Driver::new(workdir, Reporter::new(&record_path), runner).unwrap();

    let exit = driver.run_with(spec_from(&env_vars(&server))).await;

    assert_eq!(exit, 1);
    match read_record(&record_path).await {
        TerminationRecord::Worker { error, .. } => {
            assert!(
                error.contains("dependency install failed"),
                "error: {error}"
            );
        }
        other => panic!("unexpected record: {other:?}"),
    }
}

#[tokio::test]
async fn upload_failure_becomes_a_worker_record_with_output_tails() {
    let mut server = mockito::Server::new_async().await;
    let _code = server
        .mock("GET", "/code")
        .with_body("echo the output\n")
        .create_async()
        .await;
    let _reqs = server.mock("GET", "/reqs").with_body("").create_async().await;
    let _pred = server.mock("GET", "/pred-a").with_body("p").create_async().await;
    let _put = server.mock("PUT", "/out").with_status(500).create_async().await;

    let h = harness();
    let exit = h.driver.run_with(spec_from(&env_vars(&server))).await;

    assert_eq!(exit, 1);
    match read_record(&h.record_path).await {
        TerminationRecord::Worker {
            error,
            task_stdout_tail,
            ..
        } => {
            assert!(error.contains("transfer failed"), "error: {error}");
            // The task did run, so its captured output makes it into
            // the record.
            assert_eq!(task_stdout_tail, "the output\n");
        }
        other => panic!("unexpected record: {other:?}"),
    }
}
