//! procrun - run external processes and watch them end.
//!
//! Launches a child process, streams its stdout and stderr into a
//! caller-supplied [`Logger`] with optional filtering, enforces an optional
//! wall-clock timeout, and resolves according to the exit code. Running
//! children are recorded in a [`ProcessTracker`] so they can all be
//! terminated on shutdown.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use procrun::{LogFilter, RunSpec, TracingLogger};
//!
//! #[tokio::main]
//! async fn main() {
//!     let spec = RunSpec::new("cargo")
//!         .args(["build", "--release"])
//!         .logger(Arc::new(TracingLogger::new("cargo")))
//!         .log_filter(LogFilter::any_of([regex::Regex::new("error|warning").unwrap()]))
//!         .timeout_ms(600_000);
//!
//!     match procrun::run(spec).await {
//!         Ok(()) => println!("build finished"),
//!         Err(e) if e.is_timeout() => eprintln!("build hung: {e}"),
//!         Err(e) => eprintln!("build failed ({}): {e}", e.code()),
//!     }
//!
//!     // On shutdown:
//!     procrun::kill_all();
//! }
//! ```

pub mod error;
pub mod log;
pub mod process;

pub use error::{ErrorCode, Result, RunError};
pub use log::{Level, LogFilter, Logger, Matcher, TracingLogger};
pub use process::{global_tracker, ProcessRunner, ProcessTracker, RunSpec};

/// Run `spec` to completion, tracking it in the process-wide tracker.
///
/// # Errors
///
/// See [`ProcessRunner::run`].
pub async fn run(spec: RunSpec) -> Result<()> {
    ProcessRunner::new().run(spec).await
}

/// Send `SIGTERM` to every child started through the process-wide tracker.
pub fn kill_all() {
    global_tracker().kill_all();
}

/// Pids of children in the process-wide tracker that are still running.
pub fn running_pids() -> Vec<u32> {
    global_tracker().pids()
}
