//! `deployer envs` — list configured environments.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use deployer_core::DeployerConfig;

/// Arguments for `deployer envs`.
#[derive(Args, Debug)]
pub struct EnvsArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize, Tabled)]
struct EnvRow {
    #[tabled(rename = "environment")]
    environment: String,
    #[tabled(rename = "repo path")]
    path: String,
    #[tabled(rename = "branch")]
    branch: String,
    #[tabled(rename = "working dir")]
    working_dir: String,
}

impl EnvsArgs {
    pub fn run(self, config: &DeployerConfig) -> Result<()> {
        let rows: Vec<EnvRow> = config
            .environments
            .iter()
            .map(|(name, profile)| EnvRow {
                environment: name.to_string(),
                path: profile.path.clone(),
                branch: profile.branch.clone(),
                working_dir: profile.working_dir.display().to_string(),
            })
            .collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize environments")?
            );
            return Ok(());
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
