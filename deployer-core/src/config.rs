//! Injected deployer configuration.
//!
//! # Lookup order
//!
//! ```text
//! --config <path>                 (explicit, must exist)
//! ./deployer.yaml                 (current directory)
//! ~/.deployer/config.yaml         (per-user default)
//! ```
//!
//! # API pattern
//!
//! Filesystem-touching functions come in two forms, as elsewhere in the
//! workspace:
//! - `fn_at(…)` — explicit directories; used in tests with `TempDir`
//! - `fn(…)` — derives them from the process, delegates to `_at`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{CredentialVars, EnvironmentName, EnvironmentProfile, RetryPolicy};

/// File name looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = "deployer.yaml";

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// How the external deploy command is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploySettings {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Flag preceding the bundle config path. `null` omits the path entirely
    /// and lets the tool discover its bundle from the working directory.
    #[serde(default = "default_bundle_flag")]
    pub bundle_config_flag: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_program() -> String {
    "databricks".to_string()
}

fn default_args() -> Vec<String> {
    vec!["bundles".to_string(), "deploy".to_string()]
}

fn default_bundle_flag() -> Option<String> {
    Some("--bundle-config".to_string())
}

fn default_max_retries() -> u32 {
    RetryPolicy::DEFAULT_MAX_ATTEMPTS
}

fn default_retry_delay_secs() -> u64 {
    RetryPolicy::DEFAULT_DELAY.as_secs()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            bundle_config_flag: default_bundle_flag(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl DeploySettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Root of the deployer YAML config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployerConfig {
    #[serde(default)]
    pub credentials: CredentialVars,
    #[serde(default)]
    pub deploy: DeploySettings,
    #[serde(default)]
    pub environments: BTreeMap<EnvironmentName, EnvironmentProfile>,
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

impl DeployerConfig {
    /// Parse and validate a YAML document.
    ///
    /// Relative `working_dir` entries are anchored at `base_dir`; `origin` is
    /// only used to label parse errors.
    pub fn from_yaml_str(yaml: &str, base_dir: &Path, origin: &Path) -> Result<Self, ConfigError> {
        let mut config: DeployerConfig =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
                path: origin.to_path_buf(),
                source: e,
            })?;
        config.validate()?;
        for profile in config.environments.values_mut() {
            if profile.working_dir.is_relative() {
                profile.working_dir = base_dir.join(&profile.working_dir);
            }
        }
        Ok(config)
    }

    /// Load the config file at `path`.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::from_yaml_str(&contents, base_dir, path)
    }

    /// Load `explicit` if given, otherwise the first config found by
    /// [`discover_at`].
    pub fn load_from(
        explicit: Option<&Path>,
        cwd: &Path,
        home: Option<&Path>,
    ) -> Result<(PathBuf, Self), ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => discover_at(cwd, home)?,
        };
        let config = Self::load_at(&path)?;
        Ok((path, config))
    }

    /// `load_from` convenience wrapper using the process cwd and home.
    pub fn load(explicit: Option<&Path>) -> Result<(PathBuf, Self), ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| io_err(".", e))?;
        let home = dirs::home_dir();
        Self::load_from(explicit, &cwd, home.as_deref())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.environments.is_empty() {
            return Err(ConfigError::NoEnvironments);
        }
        for (name, profile) in &self.environments {
            profile.validate(name)?;
        }
        self.retry_policy()?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Profile for `environment`, or `UnknownEnvironment`.
    pub fn profile(
        &self,
        environment: &EnvironmentName,
    ) -> Result<&EnvironmentProfile, ConfigError> {
        self.environments
            .get(environment)
            .ok_or_else(|| ConfigError::UnknownEnvironment {
                name: environment.0.clone(),
                known: self.environment_names().map(|n| n.0.clone()).collect(),
            })
    }

    /// Configured environment names in sorted order.
    pub fn environment_names(&self) -> impl Iterator<Item = &EnvironmentName> {
        self.environments.keys()
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        RetryPolicy::new(
            self.deploy.max_retries,
            Duration::from_secs(self.deploy.retry_delay_secs),
        )
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// `<home>/.deployer/config.yaml` — pure, no I/O.
pub fn user_config_path_at(home: &Path) -> PathBuf {
    home.join(".deployer").join("config.yaml")
}

/// First existing config among `<cwd>/deployer.yaml` and the per-user file.
pub fn discover_at(cwd: &Path, home: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let mut searched = vec![cwd.join(LOCAL_CONFIG_FILE)];
    if let Some(home) = home {
        searched.push(user_config_path_at(home));
    }
    match searched.iter().find(|p| p.is_file()) {
        Some(found) => Ok(found.clone()),
        None => Err(ConfigError::NotFound { searched }),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
