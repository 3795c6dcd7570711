//! Error types for deployer-repos.

use std::fmt;

use thiserror::Error;

use deployer_core::{AuthError, ConfigError};

/// Failure talking to the remote repos API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, TLS, or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body was not the expected JSON.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Which remote call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Lookup,
    Create,
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Lookup => write!(f, "lookup"),
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
        }
    }
}

/// All errors that can arise from reconciliation. None are retried.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// The remote API answered with a non-success status.
    #[error("repo {operation} failed with HTTP {status}: {body}")]
    Remote {
        operation: Operation,
        status: u16,
        body: String,
    },

    #[error("repo {operation} failed: {message}")]
    Transport { operation: Operation, message: String },

    #[error("repo {operation} returned an undecodable body: {message}")]
    Decode { operation: Operation, message: String },
}

impl ReconcileError {
    /// Attach the failing operation to an [`ApiError`].
    pub(crate) fn during(operation: Operation) -> impl FnOnce(ApiError) -> ReconcileError {
        move |err| match err {
            ApiError::Status { status, body } => ReconcileError::Remote {
                operation,
                status,
                body,
            },
            ApiError::Transport(message) => ReconcileError::Transport { operation, message },
            ApiError::Decode(message) => ReconcileError::Decode { operation, message },
        }
    }
}
