//! Child process running and tracking.
//!
//! This module spawns a child with piped output, forwards that output to a
//! logger as it arrives, enforces an optional timeout, and keeps a registry
//! of running children so they can all be terminated at once.

mod runner;
mod signal;
mod spec;
mod tracker;

pub use runner::ProcessRunner;
pub use spec::RunSpec;
pub use tracker::{global_tracker, ProcessTracker};
pub(crate) use tracker::Registration;
