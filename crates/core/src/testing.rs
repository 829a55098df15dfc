//! Scripted execution backend for tests
//!
//! `ScriptedRunner` resolves executables from a fixed table and replays
//! queued outcomes instead of spawning processes. Every `run` call is
//! recorded so tests can assert on the exact program and arguments.

use crate::exec::{ExecutionRunner, ProcessError};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Directory that scripted lookups resolve into
pub const SCRIPTED_BIN_DIR: &str = "/opt/warden/bin";

/// What a scripted run does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Exit with status 0
    Success,
    /// Exit with the given non-zero status
    Exit(i32),
    /// Fail before the process starts
    StartFailure(String),
    /// Fail while waiting
    WaitFailure(String),
    /// Block until the cancellation token fires
    Hang,
}

/// A recorded `run` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ScriptedRunner {
    missing: HashSet<String>,
    outcomes: Mutex<VecDeque<Outcome>>,
    invocations: Mutex<Vec<Invocation>>,
    cancel_tokens: Mutex<Vec<CancellationToken>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `look_path` fail for `name`
    pub fn with_missing(mut self, name: impl Into<String>) -> Self {
        self.missing.insert(name.into());
        self
    }

    /// Queue an outcome for the next run; runs without a queued outcome succeed
    pub fn with_outcome(self, outcome: Outcome) -> Self {
        self.outcomes
            .lock()
            .expect("outcome queue poisoned")
            .push_back(outcome);
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .expect("invocation log poisoned")
            .clone()
    }

    /// Cancellation tokens handed to each `run` call, in call order
    pub fn cancel_tokens(&self) -> Vec<CancellationToken> {
        self.cancel_tokens
            .lock()
            .expect("token log poisoned")
            .clone()
    }

    /// Path that `look_path(name)` resolves to
    pub fn resolved(name: &str) -> PathBuf {
        Path::new(SCRIPTED_BIN_DIR).join(name)
    }
}

#[async_trait]
impl ExecutionRunner for ScriptedRunner {
    fn look_path(&self, name: &str) -> io::Result<PathBuf> {
        if name.is_empty() || self.missing.contains(name) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "executable file not found in $PATH",
            ));
        }
        Ok(Self::resolved(name))
    }

    async fn run(
        &self,
        cancel: &CancellationToken,
        program: &Path,
        args: &[String],
    ) -> Result<(), ProcessError> {
        self.invocations
            .lock()
            .expect("invocation log poisoned")
            .push(Invocation {
                program: program.to_path_buf(),
                args: args.to_vec(),
            });
        self.cancel_tokens
            .lock()
            .expect("token log poisoned")
            .push(cancel.clone());

        let outcome = self
            .outcomes
            .lock()
            .expect("outcome queue poisoned")
            .pop_front()
            .unwrap_or(Outcome::Success);

        match outcome {
            Outcome::Success => Ok(()),
            Outcome::Exit(code) => Err(ProcessError::Exit(code)),
            Outcome::StartFailure(message) => Err(ProcessError::Start(io::Error::other(message))),
            Outcome::WaitFailure(message) => Err(ProcessError::Wait(message)),
            Outcome::Hang => {
                cancel.cancelled().await;
                Err(ProcessError::Wait("context canceled".to_string()))
            }
        }
    }
}
