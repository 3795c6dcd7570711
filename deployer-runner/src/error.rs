//! Error types for deployer-runner.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use deployer_core::{ConfigError, EnvironmentName};
use deployer_repos::ReconcileError;

use crate::command::CommandOutcome;

/// Why a single deploy attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub attempt: u32,
    pub exit_code: Option<i32>,
    pub stderr_tail: String,
}

impl AttemptFailure {
    pub fn from_outcome(attempt: u32, outcome: &CommandOutcome) -> Self {
        Self {
            attempt,
            exit_code: outcome.exit_code,
            stderr_tail: outcome.stderr_tail(),
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "exit status {code}")?,
            None => write!(f, "terminated by signal")?,
        }
        if !self.stderr_tail.is_empty() {
            write!(f, ": {}", self.stderr_tail)?;
        }
        Ok(())
    }
}

/// All errors that can arise from a deploy call.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Reconciliation failed; no deploy attempt was made.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{} working directory {} does not exist", environment.tag(), path.display())]
    MissingWorkingDir {
        environment: EnvironmentName,
        path: PathBuf,
    },

    /// The deploy tool could not be started at all.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Every attempt exited non-zero.
    #[error("{} Failed to deploy after {attempts} attempts (last: {last})", environment.tag())]
    Exhausted {
        environment: EnvironmentName,
        attempts: u32,
        last: AttemptFailure,
    },
}
