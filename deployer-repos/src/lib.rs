//! # deployer-repos
//!
//! Remote repo reconciliation.
//!
//! [`Reconciler::reconcile`] makes sure an environment's repo exists at its
//! canonical path and points at its target branch, talking to the remote
//! API through the [`ReposApi`] seam ([`HttpReposClient`] in production).

pub mod client;
pub mod error;
pub mod model;
pub mod reconcile;

pub use client::{HttpReposClient, ReposApi};
pub use error::{ApiError, Operation, ReconcileError};
pub use model::{CreateRepo, Repo, RepoId};
pub use reconcile::{CredentialSource, ReconcileAction, Reconciler, Reconciliation};
