//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::infrastructure::releases::Release;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents as bytes (property lists may be binary).
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// External command runner abstraction.
pub trait CommandRunner: Send + Sync {
    /// Run a command with arguments.
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output>;

    /// Run a command, killing it if it has not exited within `timeout`.
    ///
    /// Fails with `io::ErrorKind::TimedOut` when the deadline passes.
    fn run_with_timeout(&self, cmd: &str, args: &[&str], timeout: Duration) -> io::Result<Output>;

    /// Start a command detached from this process and return its pid.
    /// The child is never waited for.
    fn spawn_detached(&self, cmd: &str, args: &[&str]) -> io::Result<u32>;

    /// Whether a process with `pid` is still running.
    fn is_alive(&self, pid: u32) -> bool;
}

/// Enumerates the data types currently on the general pasteboard.
pub trait PasteboardInspector: Send + Sync {
    /// Type identifiers in pasteboard order, without duplicates.
    fn types(&self) -> io::Result<Vec<String>>;
}

/// Reads the plain-text representation of the clipboard.
pub trait ClipboardReader: Send + Sync {
    fn text(&self) -> io::Result<String>;
}

/// Source of published workflow releases.
pub trait ReleaseSource: Send + Sync {
    /// All releases, newest first as published.
    fn releases(&self) -> io::Result<Vec<Release>>;

    /// Download `url` to `dest`.
    fn download(&self, url: &str, dest: &Path) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Real command runner implementation.
#[derive(Debug, Default)]
pub struct RealCommandRunner;

/// Poll interval while waiting for a child with a deadline.
const WAIT_POLL: Duration = Duration::from_millis(10);

fn drain<R: Read>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        // a read error leaves whatever arrived before it
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

/// Kill and reap `child` and, on unix, every process in its group.
fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    {
        let _ = Command::new("kill")
            .args(["-KILL", "--", &format!("-{}", child.id())])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
    let _ = child.kill();
    let _ = child.wait();
}

impl CommandRunner for RealCommandRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        Command::new(cmd).args(args).output()
    }

    fn run_with_timeout(&self, cmd: &str, args: &[&str], timeout: Duration) -> io::Result<Output> {
        let mut command = Command::new(cmd);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so a timeout also takes down grandchildren
        // still holding the pipes
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut child = command.spawn()?;

        // Pipes are drained on their own threads so a chatty child cannot
        // block on a full pipe while we poll.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_reader = thread::spawn(move || drain(stdout));
        let stderr_reader = thread::spawn(move || drain(stderr));

        let deadline = Instant::now() + timeout;
        let waited = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Ok(status),
                Ok(None) if Instant::now() >= deadline => {
                    break Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("{} did not exit within {:?}", cmd, timeout),
                    ));
                }
                Ok(None) => thread::sleep(WAIT_POLL),
                Err(e) => break Err(e),
            }
        };

        if waited.is_err() {
            kill_group(&mut child);
        }
        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        waited.map(|status| Output {
            status,
            stdout,
            stderr,
        })
    }

    fn spawn_detached(&self, cmd: &str, args: &[&str]) -> io::Result<u32> {
        let mut command = Command::new(cmd);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Own process group, so Alfred killing the script filter does not take it down
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        command.spawn().map(|child| child.id())
    }

    fn is_alive(&self, pid: u32) -> bool {
        Command::new("kill")
            .args(["-0", &pid.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn given_fast_command_when_run_with_timeout_then_captures_stdout() {
        let out = RealCommandRunner
            .run_with_timeout("echo", &["hello"], Duration::from_secs(5))
            .expect("echo runs");
        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "hello");
    }

    #[test]
    fn given_slow_command_when_run_with_timeout_then_times_out() {
        let err = RealCommandRunner
            .run_with_timeout("sleep", &["5"], Duration::from_millis(100))
            .expect_err("sleep is killed");
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn given_grandchild_holding_pipe_when_timed_out_then_returns_promptly() {
        let started = Instant::now();
        let err = RealCommandRunner
            .run_with_timeout(
                "sh",
                &["-c", "echo partial; sleep 5; echo done"],
                Duration::from_millis(200),
            )
            .expect_err("shell is killed");
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(
            started.elapsed() < Duration::from_secs(4),
            "took {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn given_failing_command_when_run_with_timeout_then_status_and_stderr_captured() {
        let out = RealCommandRunner
            .run_with_timeout("sh", &["-c", "echo oops >&2; exit 3"], Duration::from_secs(5))
            .expect("sh runs");
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&out.stderr).trim(), "oops");
    }

    #[test]
    fn given_own_pid_when_is_alive_then_true() {
        assert!(RealCommandRunner.is_alive(std::process::id()));
    }
}
