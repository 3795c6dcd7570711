//! Wire types for the remote repos API (`/api/2.0/repos`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque remote identifier. The API emits numbers; strings are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawRepoId", into = "String")]
pub struct RepoId(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRepoId {
    Number(u64),
    Text(String),
}

impl From<RawRepoId> for RepoId {
    fn from(raw: RawRepoId) -> Self {
        match raw {
            RawRepoId::Number(n) => Self(n.to_string()),
            RawRepoId::Text(s) => Self(s),
        }
    }
}

impl From<RepoId> for String {
    fn from(id: RepoId) -> Self {
        id.0
    }
}

impl From<&str> for RepoId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A repo as reported by the remote system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    pub id: RepoId,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_commit_id: Option<String>,
}

/// One page of a prefix lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoPage {
    #[serde(default)]
    pub repos: Vec<Repo>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// `POST /api/2.0/repos` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRepo {
    pub url: String,
    pub provider: String,
    pub path: String,
    pub branch: String,
}

/// `PATCH /api/2.0/repos/{id}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRepo {
    pub branch: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_string_ids_decode_alike() {
        let numeric: Repo = serde_json::from_str(r#"{"id": 42, "path": "/Repos/a"}"#).expect("num");
        let text: Repo = serde_json::from_str(r#"{"id": "42", "path": "/Repos/a"}"#).expect("str");
        assert_eq!(numeric.id, RepoId::from("42"));
        assert_eq!(numeric, text);
    }

    #[test]
    fn page_without_repos_key_is_empty() {
        let page: RepoPage = serde_json::from_str("{}").expect("page");
        assert!(page.repos.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let repo: Repo = serde_json::from_str(
            r#"{"id": 7, "path": "/Repos/a", "sparse_checkout": {"patterns": []}}"#,
        )
        .expect("decode");
        assert_eq!(repo.path, "/Repos/a");
    }
}
