//! Check-then-create-or-update reconciliation of an environment's repo.
//!
//! 1. Resolve the environment profile (`ConfigError` if unknown).
//! 2. Resolve host + token (`AuthError` if either is absent).
//! 3. Prefix lookup on the canonical path, then exact-path match.
//! 4. Match found → force the target branch onto that repo id.
//! 5. No match → create the repo at the canonical path.
//!
//! Steps 1 and 2 happen before any network call. No step is retried here.

use deployer_core::{AuthError, CredentialVars, Credentials, DeployerConfig, EnvironmentName};

use crate::client::ReposApi;
use crate::error::{Operation, ReconcileError};
use crate::model::{CreateRepo, Repo};

/// Resolves credentials from process-wide settings.
pub type CredentialSource = Box<dyn Fn(&CredentialVars) -> Result<Credentials, AuthError>>;

/// What reconciliation did to the remote repo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    Created,
    Updated,
}

/// Outcome of a successful [`Reconciler::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub repo: Repo,
    pub action: ReconcileAction,
}

/// Ensures each environment's repo exists at its canonical path on its
/// target branch.
pub struct Reconciler<'a, A> {
    config: &'a DeployerConfig,
    api: A,
    credentials: CredentialSource,
}

impl<'a, A: ReposApi> Reconciler<'a, A> {
    /// Reconciler reading credentials from the process environment.
    pub fn new(config: &'a DeployerConfig, api: A) -> Self {
        Self {
            config,
            api,
            credentials: Box::new(Credentials::from_env),
        }
    }

    /// Replace the credential source.
    pub fn with_credentials<F>(mut self, source: F) -> Self
    where
        F: Fn(&CredentialVars) -> Result<Credentials, AuthError> + 'static,
    {
        self.credentials = Box::new(source);
        self
    }

    pub fn config(&self) -> &'a DeployerConfig {
        self.config
    }

    pub fn reconcile(
        &self,
        environment: &EnvironmentName,
    ) -> Result<Reconciliation, ReconcileError> {
        let profile = self.config.profile(environment)?;
        let creds = (self.credentials)(&self.config.credentials)?;
        let tag = environment.tag();

        let candidates = self
            .api
            .list_by_prefix(&creds, &profile.path)
            .map_err(ReconcileError::during(Operation::Lookup))?;

        // Prefix results may include siblings such as `<path>-extra`.
        match candidates.into_iter().find(|r| r.path == profile.path) {
            Some(existing) => {
                tracing::info!(
                    "{tag} Repo path '{}' already exists (id {}).",
                    existing.path,
                    existing.id
                );
                if existing.branch.as_deref() == Some(profile.branch.as_str()) {
                    tracing::debug!(
                        "{tag} branch '{}' already current; updating anyway",
                        profile.branch
                    );
                }
                self.api
                    .update_branch(&creds, &existing.id, &profile.branch)
                    .map_err(ReconcileError::during(Operation::Update))?;
                tracing::info!(
                    "{tag} Updated repo {} to branch '{}'.",
                    existing.id,
                    profile.branch
                );
                Ok(Reconciliation {
                    repo: Repo {
                        branch: Some(profile.branch.clone()),
                        ..existing
                    },
                    action: ReconcileAction::Updated,
                })
            }
            None => {
                let request = CreateRepo {
                    url: profile.url.clone(),
                    provider: profile.provider.clone(),
                    path: profile.path.clone(),
                    branch: profile.branch.clone(),
                };
                let repo = self
                    .api
                    .create(&creds, &request)
                    .map_err(ReconcileError::during(Operation::Create))?;
                tracing::info!("{tag} Created repo at path: {}", repo.path);
                Ok(Reconciliation {
                    repo,
                    action: ReconcileAction::Created,
                })
            }
        }
    }
}
