//! `deployer reconcile --env <name>` — repo create-or-update only.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use deployer_core::{DeployerConfig, EnvironmentName};
use deployer_repos::{HttpReposClient, ReconcileAction, Reconciler};

/// Arguments for `deployer reconcile`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Environment whose repo to reconcile.
    #[arg(long = "env", short = 'e', value_name = "NAME")]
    pub env: String,
}

impl ReconcileArgs {
    pub fn run(self, config: &DeployerConfig) -> Result<()> {
        let environment = EnvironmentName::from(self.env);
        let client = HttpReposClient::new(config.deploy.request_timeout());
        let outcome = Reconciler::new(config, client)
            .reconcile(&environment)
            .with_context(|| format!("reconcile failed for '{environment}'"))?;

        let verb = match outcome.action {
            ReconcileAction::Created => "created",
            ReconcileAction::Updated => "updated",
        };
        println!(
            "{} {} repo {}: id {} at {} on {}",
            "✓".green().bold(),
            environment,
            verb,
            outcome.repo.id,
            outcome.repo.path,
            outcome.repo.branch.as_deref().unwrap_or("-"),
        );
        Ok(())
    }
}
