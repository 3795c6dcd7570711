//! Thin blocking client for the remote repos API.
//!
//! | Operation       | Method | Target                                  |
//! |-----------------|--------|-----------------------------------------|
//! | Lookup (prefix) | GET    | `{host}/api/2.0/repos?path_prefix=…`    |
//! | Create          | POST   | `{host}/api/2.0/repos`                  |
//! | Update branch   | PATCH  | `{host}/api/2.0/repos/{id}`             |
//!
//! Every request carries `Authorization: Bearer <token>` and
//! `Content-Type: application/json`.

use std::collections::HashSet;
use std::time::Duration;

use serde::de::DeserializeOwned;

use deployer_core::Credentials;

use crate::error::ApiError;
use crate::model::{CreateRepo, Repo, RepoId, RepoPage, UpdateRepo};

const REPOS_ENDPOINT: &str = "/api/2.0/repos";

/// The three remote calls reconciliation depends on.
pub trait ReposApi {
    /// Every repo whose path starts with `prefix`, across all pages.
    ///
    /// Paging stops early if the server hands back a token it already sent.
    fn list_by_prefix(&self, creds: &Credentials, prefix: &str) -> Result<Vec<Repo>, ApiError>;

    fn create(&self, creds: &Credentials, request: &CreateRepo) -> Result<Repo, ApiError>;

    /// Point repo `id` at `branch`. Always issued, even if it already matches.
    fn update_branch(&self, creds: &Credentials, id: &RepoId, branch: &str)
        -> Result<(), ApiError>;
}

impl<T: ReposApi + ?Sized> ReposApi for &T {
    fn list_by_prefix(&self, creds: &Credentials, prefix: &str) -> Result<Vec<Repo>, ApiError> {
        (**self).list_by_prefix(creds, prefix)
    }

    fn create(&self, creds: &Credentials, request: &CreateRepo) -> Result<Repo, ApiError> {
        (**self).create(creds, request)
    }

    fn update_branch(
        &self,
        creds: &Credentials,
        id: &RepoId,
        branch: &str,
    ) -> Result<(), ApiError> {
        (**self).update_branch(creds, id, branch)
    }
}

/// [`ReposApi`] over HTTP, backed by a shared `ureq::Agent`.
#[derive(Clone)]
pub struct HttpReposClient {
    agent: ureq::Agent,
}

impl HttpReposClient {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }

    fn request(&self, method: &str, url: &str, creds: &Credentials) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", creds.token))
            .set("Content-Type", "application/json")
    }
}

impl ReposApi for HttpReposClient {
    fn list_by_prefix(&self, creds: &Credentials, prefix: &str) -> Result<Vec<Repo>, ApiError> {
        let url = format!("{}{REPOS_ENDPOINT}", creds.host);
        let mut repos = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        loop {
            let mut request = self
                .request("GET", &url, creds)
                .query("path_prefix", prefix);
            if let Some(token) = page_token.as_deref() {
                request = request.query("next_page_token", token);
            }
            let page: RepoPage = decode(check(request.call())?)?;
            repos.extend(page.repos);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) if !seen_tokens.insert(next.clone()) => {
                    tracing::warn!(prefix, token = %next, "repo listing repeated a page token");
                    break;
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        tracing::debug!(prefix, found = repos.len(), "repo prefix lookup");
        Ok(repos)
    }

    fn create(&self, creds: &Credentials, request: &CreateRepo) -> Result<Repo, ApiError> {
        let url = format!("{}{REPOS_ENDPOINT}", creds.host);
        let response = check(self.request("POST", &url, creds).send_json(request))?;
        let body = response
            .into_string()
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        tracing::debug!(%body, "repo create response");
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn update_branch(
        &self,
        creds: &Credentials,
        id: &RepoId,
        branch: &str,
    ) -> Result<(), ApiError> {
        let url = format!("{}{REPOS_ENDPOINT}/{id}", creds.host);
        let body = UpdateRepo {
            branch: branch.to_string(),
        };
        check(self.request("PATCH", &url, creds).send_json(&body))?;
        Ok(())
    }
}

/// Map every non-2xx outcome to [`ApiError`].
fn check(result: Result<ureq::Response, ureq::Error>) -> Result<ureq::Response, ApiError> {
    match result {
        Ok(response) if (200..300).contains(&response.status()) => Ok(response),
        Ok(response) => Err(status_error(response)),
        Err(ureq::Error::Status(_, response)) => Err(status_error(response)),
        Err(ureq::Error::Transport(transport)) => Err(ApiError::Transport(transport.to_string())),
    }
}

fn status_error(response: ureq::Response) -> ApiError {
    let status = response.status();
    let body = response.into_string().unwrap_or_default();
    ApiError::Status { status, body }
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, ApiError> {
    let body = response
        .into_string()
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
}
