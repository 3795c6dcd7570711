//! Domain types shared by the reconciler and the runner.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, ConfigError};

/// Revision used when a profile does not name one.
pub const DEFAULT_BRANCH: &str = "main";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed environment identifier (`dev`, `stage`, `prod`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentName(pub String);

impl EnvironmentName {
    /// Uppercase tag used to prefix operator-facing status lines, e.g. `[DEV]`.
    pub fn tag(&self) -> String {
        format!("[{}]", self.0.to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for EnvironmentName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EnvironmentName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Environment profile
// ---------------------------------------------------------------------------

/// Desired state of one environment's remote repo plus where its bundle lives.
///
/// Fields default to empty on deserialization so that validation can report
/// exactly which one is missing instead of a generic parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentProfile {
    /// Canonical remote path, unique per environment.
    #[serde(default)]
    pub path: String,
    /// Source-control URL the repo mirrors.
    #[serde(default)]
    pub url: String,
    /// Provider tag understood by the remote API (e.g. `gitHub`).
    #[serde(default)]
    pub provider: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Directory holding the environment's deployment configuration.
    #[serde(default)]
    pub working_dir: PathBuf,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

impl EnvironmentProfile {
    /// Check that every required field is present.
    pub fn validate(&self, environment: &EnvironmentName) -> Result<(), ConfigError> {
        let missing = |field: &'static str| ConfigError::MissingField {
            environment: environment.0.clone(),
            field,
        };
        if self.path.trim().is_empty() {
            return Err(missing("path"));
        }
        if self.url.trim().is_empty() {
            return Err(missing("url"));
        }
        if self.provider.trim().is_empty() {
            return Err(missing("provider"));
        }
        if self.branch.trim().is_empty() {
            return Err(missing("branch"));
        }
        if self.working_dir.as_os_str().is_empty() {
            return Err(missing("working_dir"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Bounded fixed-delay retry for the external deploy command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

    pub fn new(max_attempts: u32, delay: Duration) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::InvalidRetries(max_attempts));
        }
        Ok(Self {
            max_attempts,
            delay,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether a failure at 1-indexed `attempt` is followed by another try.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            delay: Self::DEFAULT_DELAY,
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Names of the process settings that carry the remote host and token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialVars {
    #[serde(default = "default_host_var")]
    pub host_var: String,
    #[serde(default = "default_token_var")]
    pub token_var: String,
}

fn default_host_var() -> String {
    "DATABRICKS_HOST".to_string()
}

fn default_token_var() -> String {
    "DATABRICKS_TOKEN".to_string()
}

impl Default for CredentialVars {
    fn default() -> Self {
        Self {
            host_var: default_host_var(),
            token_var: default_token_var(),
        }
    }
}

/// Host endpoint and bearer token for the remote API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Host with any trailing `/` removed.
    pub host: String,
    pub token: String,
}

impl Credentials {
    /// Resolve credentials through `lookup`. Empty values count as absent;
    /// surrounding whitespace is stripped from both host and token.
    pub fn resolve<F>(vars: &CredentialVars, lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AuthError::MissingSetting {
                    name: name.to_string(),
                })
        };
        let host = fetch(&vars.host_var)?;
        let token = fetch(&vars.token_var)?;
        Ok(Self {
            host: host.trim().trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        })
    }

    /// Resolve credentials from the process environment.
    pub fn from_env(vars: &CredentialVars) -> Result<Self, AuthError> {
        Self::resolve(vars, |name| std::env::var(name).ok())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn environment_tag_is_uppercase() {
        assert_eq!(EnvironmentName::from("stage").tag(), "[STAGE]");
    }

    #[test]
    fn host_trailing_slashes_are_stripped() {
        let creds = Credentials::resolve(
            &CredentialVars::default(),
            lookup(&[
                ("DATABRICKS_HOST", "https://example.cloud.databricks.com//"),
                ("DATABRICKS_TOKEN", "t0k"),
            ]),
        )
        .expect("resolve");
        assert_eq!(creds.host, "https://example.cloud.databricks.com");
        assert_eq!(creds.token, "t0k");
    }

    #[test]
    fn missing_host_is_reported_first() {
        let err = Credentials::resolve(&CredentialVars::default(), lookup(&[])).unwrap_err();
        assert_eq!(
            err,
            AuthError::MissingSetting {
                name: "DATABRICKS_HOST".to_string()
            }
        );
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let err = Credentials::resolve(
            &CredentialVars::default(),
            lookup(&[
                ("DATABRICKS_HOST", "https://h"),
                ("DATABRICKS_TOKEN", "  "),
            ]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("DATABRICKS_TOKEN"));
    }

    #[test]
    fn token_surrounding_whitespace_is_stripped() {
        let creds = Credentials::resolve(
            &CredentialVars::default(),
            lookup(&[
                ("DATABRICKS_HOST", "https://h"),
                ("DATABRICKS_TOKEN", "dapi-test\n"),
            ]),
        )
        .expect("resolve");
        assert_eq!(creds.token, "dapi-test");
    }

    #[test]
    fn debug_output_redacts_token() {
        let creds = Credentials {
            host: "https://h".to_string(),
            token: "secret-value".to_string(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("secret-value"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn retry_policy_rejects_zero_attempts() {
        let err = RetryPolicy::new(0, Duration::ZERO).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRetries(0)));
    }

    #[test]
    fn retry_policy_stops_at_last_attempt() {
        let policy = RetryPolicy::new(3, Duration::ZERO).expect("policy");
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn profile_validation_names_missing_field() {
        let profile = EnvironmentProfile {
            path: "/Repos/x".to_string(),
            url: String::new(),
            provider: "gitHub".to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            working_dir: PathBuf::from("bundles/dev"),
        };
        let err = profile.validate(&EnvironmentName::from("dev")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "url", .. }));
    }
}
