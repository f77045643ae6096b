//! Termination signal delivery.

use std::io;

/// Send `SIGTERM` to `pid`.
#[cfg(unix)]
pub(crate) fn terminate(pid: u32) -> io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("pid {pid} out of range"))
    })?;
    kill(Pid::from_raw(raw), Signal::SIGTERM).map_err(io::Error::from)
}

/// Signals by pid are unix-only.
#[cfg(not(unix))]
pub(crate) fn terminate(pid: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot signal pid {pid} on this platform"),
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_terminate_running_child() {
        let mut child = tokio::process::Command::new("sleep").arg("10").spawn().unwrap();
        terminate(child.id().unwrap()).unwrap();

        let status = child.wait().await.unwrap();
        assert_eq!(status.code(), None);
    }

    #[test]
    fn test_out_of_range_pid() {
        let err = terminate(u32::MAX).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
