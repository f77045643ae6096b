//! Run specification: what to launch and how to log and time it.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;

use crate::log::{LogFilter, Logger};

/// Default size of one read from a child's output stream.
const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Configuration for a single run.
#[derive(Clone)]
pub struct RunSpec {
    /// Program name or path; its base name prefixes every error message.
    pub executable: String,

    /// Argument list, passed through without shell interpretation.
    pub args: Vec<String>,

    /// Directory the child starts in. `None` keeps the caller's.
    pub working_dir: Option<PathBuf>,

    /// Variables layered over the inherited environment, or the whole
    /// environment when `env_clear` is set.
    pub env: HashMap<String, String>,

    /// Inherited variables the child must not see.
    pub env_remove: Vec<String>,

    /// Start the child from an empty environment (see [`RunSpec::replace_env`]).
    pub env_clear: bool,

    /// Receiver for stdout/stderr chunks. `None` disables logging.
    pub logger: Option<Arc<dyn Logger>>,

    /// Filter applied before each logger call.
    pub log_filter: LogFilter,

    /// Kill the process if it runs longer than this.
    pub timeout: Option<Duration>,

    /// Maximum size of one output chunk (default: 8 KiB).
    pub chunk_size: usize,
}

impl RunSpec {
    /// Create a spec for the given program with no arguments.
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            working_dir: None,
            env: HashMap::new(),
            env_remove: Vec::new(),
            env_clear: false,
            logger: None,
            log_filter: LogFilter::Always,
            timeout: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append arguments in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Start the child in `dir`.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Override one variable. Merged into the inherited environment unless
    /// [`RunSpec::replace_env`] was used, in which case it joins the
    /// replacement set.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Override several variables; same merging rules as [`RunSpec::env`].
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Hide an inherited variable from the child.
    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    /// Give the child exactly `vars` as its environment.
    pub fn replace_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_clear = true;
        self.env.clear();
        self.envs(vars)
    }

    /// Send output to `logger`.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Filter output before it reaches the logger.
    pub fn log_filter(mut self, filter: LogFilter) -> Self {
        self.log_filter = filter;
        self
    }

    /// Set a timeout for the process.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Set a timeout in milliseconds.
    pub fn timeout_ms(self, millis: u64) -> Self {
        self.timeout(Duration::from_millis(millis))
    }

    /// Set the output chunk size.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Base name of the executable, used in error messages.
    pub fn program_name(&self) -> String {
        Path::new(&self.executable)
            .file_name()
            .map_or_else(|| self.executable.clone(), |name| name.to_string_lossy().into_owned())
    }

    /// Build the command with piped stdout/stderr.
    ///
    /// The child is killed if its handle is dropped before it was reaped,
    /// which is what happens when a `run` future is cancelled.
    pub(crate) fn command(&self) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.args);

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        if self.env_clear {
            cmd.env_clear();
        }

        for key in &self.env_remove {
            cmd.env_remove(key);
        }

        cmd.envs(&self.env);

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }
}

impl fmt::Debug for RunSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunSpec")
            .field("executable", &self.executable)
            .field("args", &self.args)
            .field("working_dir", &self.working_dir)
            .field("env", &self.env)
            .field("env_remove", &self.env_remove)
            .field("env_clear", &self.env_clear)
            .field("logger", &self.logger.is_some())
            .field("log_filter", &self.log_filter)
            .field("timeout", &self.timeout)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}
