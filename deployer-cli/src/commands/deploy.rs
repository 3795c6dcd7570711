//! `deployer deploy --env <name>` — reconcile, then deploy with retries.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use deployer_core::{DeployerConfig, EnvironmentName, RetryPolicy};
use deployer_repos::{HttpReposClient, Reconciler};
use deployer_runner::{OutputMode, ProcessRunner, Runner};

/// Bundle file looked up inside the environment's working directory.
pub const DEFAULT_BUNDLE_FILE: &str = "bundle.yaml";

/// Arguments for `deployer deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Environment to deploy (must be declared in the config).
    #[arg(long = "env", short = 'e', value_name = "NAME")]
    pub env: String,

    /// Bundle config file. Defaults to `<working_dir>/bundle.yaml`.
    #[arg(long, value_name = "PATH")]
    pub bundle_config: Option<PathBuf>,

    /// Override the configured attempt ceiling.
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Capture the deploy tool's output instead of streaming it.
    #[arg(long)]
    pub capture_output: bool,
}

impl DeployArgs {
    pub fn run(self, config: &DeployerConfig) -> Result<()> {
        let environment = EnvironmentName::from(self.env);
        let profile = config.profile(&environment)?;
        let bundle = resolve_bundle(self.bundle_config.as_deref(), &profile.working_dir)?;

        let configured = config.retry_policy()?;
        let policy = match self.max_retries {
            Some(n) => RetryPolicy::new(n, configured.delay())?,
            None => configured,
        };
        let mode = if self.capture_output {
            OutputMode::Capture
        } else {
            OutputMode::Inherit
        };

        let client = HttpReposClient::new(config.deploy.request_timeout());
        let runner = Runner::new(Reconciler::new(config, client))
            .with_commands(ProcessRunner::new(mode));
        let report = runner
            .deploy_with(&environment, &bundle, policy)
            .with_context(|| format!("deploy failed for '{environment}'"))?;

        println!(
            "{} {} deployed (repo {} at {}, attempt {}/{})",
            "✓".green().bold(),
            environment,
            report.reconciliation.repo.id,
            report.reconciliation.repo.path,
            report.attempts,
            policy.max_attempts(),
        );
        Ok(())
    }
}

/// Explicit bundle path, or `<working_dir>/bundle.yaml`; must exist.
///
/// The result is absolute because the deploy tool runs inside `working_dir`.
fn resolve_bundle(explicit: Option<&Path>, working_dir: &Path) -> Result<PathBuf> {
    let candidate = match explicit {
        Some(path) => path.to_path_buf(),
        None => working_dir.join(DEFAULT_BUNDLE_FILE),
    };
    if !candidate.is_file() {
        anyhow::bail!("No bundle config found at: {}", candidate.display());
    }
    candidate
        .canonicalize()
        .with_context(|| format!("cannot resolve path '{}'", candidate.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_bundle_lives_in_working_dir() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join(DEFAULT_BUNDLE_FILE), "bundle: {}\n").expect("write");
        let resolved = resolve_bundle(None, dir.path()).expect("resolve");
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with(DEFAULT_BUNDLE_FILE));
    }

    #[test]
    fn missing_bundle_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let err = resolve_bundle(None, dir.path()).unwrap_err();
        assert!(err.to_string().contains("No bundle config found"));
    }

    #[test]
    fn explicit_bundle_overrides_default() {
        let dir = TempDir::new().expect("tempdir");
        let custom = dir.path().join("custom.yaml");
        std::fs::write(&custom, "bundle: {}\n").expect("write");
        let resolved = resolve_bundle(Some(&custom), Path::new("/nonexistent")).expect("resolve");
        assert!(resolved.ends_with("custom.yaml"));
    }
}
