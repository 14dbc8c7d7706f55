use std::path::PathBuf;

use clap::Parser;
use taskrun_core::driver::Driver;
use taskrun_core::report::Reporter;
use taskrun_core::runner::Runner;
use taskrun_core::workdir::WorkDir;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "taskrun-worker",
    about = "Single-task sandboxed execution worker"
)]
struct Args {
    /// Directory where task inputs are materialized and the task runs.
    #[arg(long, default_value = "/app")]
    workdir: PathBuf,

    /// Path of the termination record read by the supervisor after
    /// this process exits.
    #[arg(long, default_value = "/dev/termination-log")]
    termination_log: PathBuf,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing();

    let run_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(run_id = %run_id, workdir = %args.workdir.display(), "worker starting");

    let python_bin = std::env::var("PYTHON_BIN").unwrap_or_else(|_| "python3".to_string());

    let workdir = WorkDir::new(&args.workdir);
    let reporter = Reporter::new(&args.termination_log);
    let runner = Runner::for_python(&python_bin);

    let exit = match Driver::new(workdir, reporter, runner) {
        Ok(driver) => driver.run().await,
        Err(e) => {
            eprintln!("{e}");
            1
        }
    };
    std::process::exit(exit);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
