//! Execution backends for spawning external executables

use async_trait::async_trait;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How a spawned process failed
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The process could not be started at all
    #[error("{0}")]
    Start(#[source] io::Error),

    /// The process ran and exited with a non-zero status code
    #[error("exit status {0}")]
    Exit(i32),

    /// Waiting failed, the process was killed by a signal, or the run was cancelled
    #[error("{0}")]
    Wait(String),
}

/// Resolves executables and runs them to completion
#[async_trait]
pub trait ExecutionRunner: Send + Sync {
    /// Resolve `name` to an absolute path using the search path
    fn look_path(&self, name: &str) -> io::Result<PathBuf>;

    /// Spawn `program` with `args` and wait for it to exit
    ///
    /// Cancelling `cancel` must stop the wait and terminate the child.
    async fn run(
        &self,
        cancel: &CancellationToken,
        program: &Path,
        args: &[String],
    ) -> Result<(), ProcessError>;
}

/// Runner backed by real OS processes
#[derive(Debug, Clone, Copy, Default)]
pub struct OsExecutionRunner;

impl OsExecutionRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExecutionRunner for OsExecutionRunner {
    fn look_path(&self, name: &str) -> io::Result<PathBuf> {
        if name.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "executable name is empty",
            ));
        }

        let candidate = Path::new(name);

        // Names containing a separator are used as-is without a search
        if candidate.components().count() > 1 {
            return if is_executable(candidate) {
                std::path::absolute(candidate)
            } else {
                Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{name} is not an executable file"),
                ))
            };
        }

        let search_path = std::env::var_os("PATH").unwrap_or_default();
        search_path_for(name, &search_path)
    }

    async fn run(
        &self,
        cancel: &CancellationToken,
        program: &Path,
        args: &[String],
    ) -> Result<(), ProcessError> {
        debug!(program = %program.display(), ?args, "spawning process");

        let mut child = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .spawn()
            .map_err(ProcessError::Start)?;

        tokio::select! {
            status = child.wait() => match status {
                Ok(status) if status.success() => Ok(()),
                Ok(status) => match status.code() {
                    Some(code) => Err(ProcessError::Exit(code)),
                    None => Err(ProcessError::Wait(status.to_string())),
                },
                Err(err) => Err(ProcessError::Wait(err.to_string())),
            },
            () = cancel.cancelled() => {
                // kill() also reaps the child
                if let Err(err) = child.kill().await {
                    debug!(program = %program.display(), "failed to kill cancelled process: {err}");
                }
                Err(ProcessError::Wait("context canceled".to_string()))
            }
        }
    }
}

/// Find `name` in the directories of `search_path`
///
/// Empty and relative entries are skipped so the working directory is never
/// searched implicitly.
fn search_path_for(name: &str, search_path: &OsStr) -> io::Result<PathBuf> {
    for dir in std::env::split_paths(search_path) {
        if !dir.is_absolute() {
            continue;
        }
        let full = dir.join(name);
        if is_executable(&full) {
            return Ok(full);
        }
    }

    Err(io::Error::new(
        io::ErrorKind::NotFound,
        "executable file not found in $PATH",
    ))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
