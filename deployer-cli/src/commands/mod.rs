pub mod deploy;
pub mod envs;
pub mod reconcile;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use deployer_core::DeployerConfig;

/// Load the config once for the whole invocation.
pub fn load_config(explicit: Option<&Path>) -> Result<(PathBuf, DeployerConfig)> {
    let (path, config) = DeployerConfig::load(explicit).context("failed to load deployer config")?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok((path, config))
}
