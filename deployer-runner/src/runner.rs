//! Reconcile-then-deploy with bounded fixed-delay retry.
//!
//! ```text
//! Reconciling ─┬─> ReconcileFailed            (terminal, no attempts)
//!              └─> Attempting(1)
//! Attempting(n) ── exit 0 ──────────────────> Success
//! Attempting(n) ── exit ≠ 0, n < max ─ sleep ─> Attempting(n + 1)
//! Attempting(max) ─ exit ≠ 0 ───────────────> Exhausted
//! ```

use std::path::Path;
use std::time::Duration;

use deployer_core::{EnvironmentName, RetryPolicy};
use deployer_repos::{Reconciler, Reconciliation, ReposApi};

use crate::command::{CommandRunner, CommandSpec, ProcessRunner};
use crate::error::{AttemptFailure, DeployError};

/// Pause between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<T: Sleeper + ?Sized> Sleeper for &T {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Blocks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Summary of a successful deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub environment: EnvironmentName,
    /// 1-indexed attempt that succeeded.
    pub attempts: u32,
    pub reconciliation: Reconciliation,
}

/// Deployment Runner: reconciles the environment's repo, then runs the
/// deploy command inside the environment's working directory.
pub struct Runner<'a, A, C = ProcessRunner, S = ThreadSleeper> {
    reconciler: Reconciler<'a, A>,
    commands: C,
    sleeper: S,
}

impl<'a, A: ReposApi> Runner<'a, A> {
    pub fn new(reconciler: Reconciler<'a, A>) -> Self {
        Self {
            reconciler,
            commands: ProcessRunner::default(),
            sleeper: ThreadSleeper,
        }
    }
}

impl<'a, A, C, S> Runner<'a, A, C, S>
where
    A: ReposApi,
    C: CommandRunner,
    S: Sleeper,
{
    pub fn with_commands<C2: CommandRunner>(self, commands: C2) -> Runner<'a, A, C2, S> {
        Runner {
            reconciler: self.reconciler,
            commands,
            sleeper: self.sleeper,
        }
    }

    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> Runner<'a, A, C, S2> {
        Runner {
            reconciler: self.reconciler,
            commands: self.commands,
            sleeper,
        }
    }

    /// Deploy using the configured retry policy.
    pub fn deploy(
        &self,
        environment: &EnvironmentName,
        bundle_config: &Path,
    ) -> Result<DeployReport, DeployError> {
        let policy = self.reconciler.config().retry_policy()?;
        self.deploy_with(environment, bundle_config, policy)
    }

    /// Deploy with an explicit retry policy.
    pub fn deploy_with(
        &self,
        environment: &EnvironmentName,
        bundle_config: &Path,
        policy: RetryPolicy,
    ) -> Result<DeployReport, DeployError> {
        let reconciliation = self.reconciler.reconcile(environment)?;

        let config = self.reconciler.config();
        let profile = config.profile(environment)?;
        if !profile.working_dir.is_dir() {
            return Err(DeployError::MissingWorkingDir {
                environment: environment.clone(),
                path: profile.working_dir.clone(),
            });
        }

        let spec = CommandSpec::for_bundle(&config.deploy, &profile.working_dir, bundle_config);
        let tag = environment.tag();
        tracing::info!(
            "{tag} Deploying jobs with: {spec} (in {})",
            spec.working_dir.display()
        );

        let mut attempt = 1;
        loop {
            let outcome = self
                .commands
                .run(&spec)
                .map_err(|source| DeployError::Spawn {
                    program: spec.program.clone(),
                    source,
                })?;

            if outcome.success {
                tracing::info!("{tag} Successfully deployed on attempt {attempt}.");
                return Ok(DeployReport {
                    environment: environment.clone(),
                    attempts: attempt,
                    reconciliation,
                });
            }

            let failure = AttemptFailure::from_outcome(attempt, &outcome);
            if !policy.should_retry(attempt) {
                tracing::error!("{tag} Attempt {attempt} failed: {failure}");
                return Err(DeployError::Exhausted {
                    environment: environment.clone(),
                    attempts: attempt,
                    last: failure,
                });
            }

            tracing::warn!(
                "{tag} Attempt {attempt} failed: {failure}; retrying in {}s",
                policy.delay().as_secs()
            );
            self.sleeper.sleep(policy.delay());
            attempt += 1;
        }
    }
}
