//! taskrun-core: single-task sandboxed execution worker.
//!
//! Pipeline: validate the task spec from the environment, fetch inputs
//! from signed URLs, materialize them into a working directory,
//! install the declared dependencies, run the task as an isolated
//! subprocess, then either upload its primary output (success) or
//! persist exactly one termination record describing the failure.

pub mod blob;
pub mod config;
pub mod driver;
pub mod error;
pub mod materialize;
pub mod report;
pub mod runner;
pub mod util;
pub mod workdir;
