//! Spawn a process, stream its output into a logger, and wait for it.
//!
//! A run moves through launch, running and settled. The outcome is decided
//! by the first terminal event:
//! - a failed launch returns the raw launch error,
//! - an error from the running process rejects with [`RunError::Runtime`],
//! - an exit after the timeout fired rejects with [`RunError::Timeout`],
//! - any other exit with a non-zero code rejects with [`RunError::Failed`].
//!
//! A child that dies from a signal without the timeout having fired has no
//! exit code and is treated as a clean exit.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::debug;

use super::spec::RunSpec;
use super::tracker::{global_tracker, ProcessTracker, Registration};
use crate::error::{Result, RunError};
use crate::log::{Level, OutputLog};

/// How long to keep waiting for output readers once the child has exited.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Runs processes and records them in a [`ProcessTracker`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use procrun::{ProcessRunner, ProcessTracker, RunSpec, TracingLogger};
///
/// #[tokio::main]
/// async fn main() -> Result<(), procrun::RunError> {
///     let runner = ProcessRunner::with_tracker(ProcessTracker::new());
///
///     runner
///         .run(
///             RunSpec::new("npm")
///                 .args(["run", "build"])
///                 .logger(Arc::new(TracingLogger::new("npm")))
///                 .timeout_ms(60_000),
///         )
///         .await
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    tracker: ProcessTracker,
}

impl ProcessRunner {
    /// Create a runner backed by the process-wide tracker.
    pub fn new() -> Self {
        Self::with_tracker(global_tracker().clone())
    }

    /// Create a runner backed by `tracker`.
    pub const fn with_tracker(tracker: ProcessTracker) -> Self {
        Self { tracker }
    }

    /// The tracker this runner registers children in.
    pub const fn tracker(&self) -> &ProcessTracker {
        &self.tracker
    }

    /// Send `SIGTERM` to every child this runner's tracker knows about.
    pub fn kill_all(&self) {
        self.tracker.kill_all();
    }

    /// Snapshot of pids for children that are still running.
    pub fn running_pids(&self) -> Vec<u32> {
        self.tracker.pids()
    }

    /// Launch the process described by `spec` and wait for it to finish.
    ///
    /// Standard output is logged at [`Level::Info`] and standard error at
    /// [`Level::Warn`], one logger call per chunk read.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Launch`] if the process cannot be started,
    /// [`RunError::Runtime`] if waiting on or terminating it fails,
    /// [`RunError::Timeout`] if it outlived `spec.timeout`, and
    /// [`RunError::Failed`] if it exited with a non-zero code.
    ///
    /// Dropping the returned future before it completes kills the child
    /// and removes its pid from the tracker.
    pub async fn run(&self, spec: RunSpec) -> Result<()> {
        self.run_with(spec, request_termination).await
    }

    /// [`ProcessRunner::run`] with the timeout's termination step supplied
    /// by the caller.
    async fn run_with<F>(&self, spec: RunSpec, terminate: F) -> Result<()>
    where
        F: FnMut(&mut Child) -> io::Result<()>,
    {
        let output = OutputLog::new(spec.logger.clone(), spec.log_filter.clone());

        debug!(executable = %spec.executable, args = ?spec.args, "Spawning process");
        let mut child = spec.command().spawn().map_err(RunError::Launch)?;

        let registration = Registration::new(self.tracker.clone(), child.id());

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(forward_output(
                stdout,
                Level::Info,
                output.clone(),
                spec.chunk_size,
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(forward_output(
                stderr,
                Level::Warn,
                output.clone(),
                spec.chunk_size,
            )));
        }

        let mut state = RunState::new(spec.program_name(), registration, output);

        let outcome = match wait_for_exit(&mut child, &mut state, spec.timeout, terminate).await {
            Some(Ok(status)) => state.exit(status.code()),
            Some(Err(e)) => {
                state.error(e);
                state.exit(None)
            }
            None => {
                // Settled by an error while terminating. The child is not
                // waited for; dropping it below sends SIGKILL.
                debug!(pid = ?child.id(), "Abandoning process after failed termination");
                state.exit(None)
            }
        };
        drop(child);

        drain(readers).await;
        outcome
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for `child` to exit, terminating it once `limit` elapses.
///
/// Returns `None` if an error settled the run before the child exited.
async fn wait_for_exit<F>(
    child: &mut Child,
    state: &mut RunState,
    limit: Option<Duration>,
    mut terminate: F,
) -> Option<io::Result<ExitStatus>>
where
    F: FnMut(&mut Child) -> io::Result<()>,
{
    let Some(limit) = limit else {
        return Some(child.wait().await);
    };

    let deadline = sleep(limit);
    tokio::pin!(deadline);
    let mut armed = true;

    loop {
        tokio::select! {
            status = child.wait() => return Some(status),
            () = &mut deadline, if armed => {
                armed = false;
                if state.timeout_elapsed() {
                    debug!(pid = ?child.id(), ?limit, "Process timed out, terminating");
                    if let Err(e) = terminate(child) {
                        state.error(e);
                        return None;
                    }
                }
            }
        }
    }
}

/// Ask the child to terminate with the default signal.
fn request_termination(child: &mut Child) -> io::Result<()> {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            return super::signal::terminate(pid);
        }
    }
    child.start_kill()
}

/// Read `stream` chunk by chunk into `output` until it closes.
async fn forward_output<R>(mut stream: R, level: Level, output: OutputLog, chunk_size: usize)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => output.log(level, &buf[..n]),
            Err(e) => {
                debug!(%level, error = %e, "Stopped reading process output");
                break;
            }
        }
    }
}

/// Give output readers a moment to reach end-of-stream.
///
/// Readers still open afterwards keep logging in the background.
async fn drain(readers: Vec<JoinHandle<()>>) {
    let all = async {
        for reader in readers {
            let _ = reader.await;
        }
    };
    if timeout(OUTPUT_DRAIN_GRACE, all).await.is_err() {
        debug!("Output streams still open after exit");
    }
}

/// Per-run bookkeeping. Settles at most once.
struct RunState {
    program: String,
    registration: Registration,
    output: OutputLog,
    timed_out: bool,
    outcome: Option<Result<()>>,
}

impl RunState {
    fn new(program: String, registration: Registration, output: OutputLog) -> Self {
        Self {
            program,
            registration,
            output,
            timed_out: false,
            outcome: None,
        }
    }

    /// The timer fired. Returns whether the child should be terminated.
    fn timeout_elapsed(&mut self) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.timed_out = true;
        true
    }

    /// An error was reported for the process.
    fn error(&mut self, err: io::Error) {
        self.output.log_text(Level::Error, &err.to_string());
        self.untrack();

        if self.outcome.is_none() {
            self.outcome = Some(Err(RunError::Runtime {
                program: self.program.clone(),
                source: err,
            }));
        }
    }

    /// The process exited with `code`. Consumes the state; an earlier
    /// settlement wins over whatever the exit reports.
    fn exit(mut self, code: Option<i32>) -> Result<()> {
        if let Some(outcome) = self.outcome.take() {
            return outcome;
        }

        debug!(pid = ?self.registration.pid(), ?code, "Process exited");
        self.untrack();

        if self.timed_out {
            return Err(RunError::Timeout {
                program: self.program,
            });
        }

        match code {
            Some(code) if code != 0 => Err(RunError::Failed {
                program: self.program,
                code,
            }),
            _ => Ok(()),
        }
    }

    fn untrack(&mut self) {
        self.registration.release();
    }
}
