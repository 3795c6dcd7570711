//! Deployer core library — environment profiles, injected config, errors.
//!
//! - [`types`] — newtypes, profiles, retry policy, credentials
//! - [`config`] — YAML config load / discovery
//! - [`error`] — [`ConfigError`], [`AuthError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{DeployerConfig, DeploySettings};
pub use error::{AuthError, ConfigError};
pub use types::{
    CredentialVars, Credentials, EnvironmentName, EnvironmentProfile, RetryPolicy, DEFAULT_BRANCH,
};
