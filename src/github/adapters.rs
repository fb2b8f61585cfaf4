//! JSON adapters for GitHub REST responses.
//!
//! Tolerant parsing: fields the relay does not rely on are defaulted so new or
//! missing keys never break decoding. Each record converts into the domain
//! types in [`super`].

use serde::Deserialize;

use super::{AgentIdentity, IssueState, RemoteFile, RemoteIssue};

// --- Issues ---

#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub login: String,
    #[serde(default)]
    pub node_id: String,
}

impl From<UserPayload> for AgentIdentity {
    fn from(user: UserPayload) -> Self {
        AgentIdentity {
            login: user.login,
            opaque_id: user.node_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelPayload {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuePayload {
    pub number: u64,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default)]
    pub assignees: Vec<UserPayload>,
    #[serde(default)]
    pub labels: Vec<LabelPayload>,
}

fn default_state() -> String {
    "open".to_string()
}

impl From<IssuePayload> for RemoteIssue {
    fn from(issue: IssuePayload) -> Self {
        RemoteIssue {
            number: issue.number,
            node_id: issue.node_id.filter(|id| !id.is_empty()),
            url: issue.html_url,
            title: issue.title,
            state: IssueState::parse(&issue.state),
            assignees: issue.assignees.into_iter().map(Into::into).collect(),
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

/// `GET /search/issues`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPayload {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<IssuePayload>,
}

// --- Repository, refs, contents ---

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPayload {
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefObject {
    pub sha: String,
}

/// `GET /repos/{o}/{r}/git/ref/heads/{branch}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefPayload {
    pub object: RefObject,
}

/// `GET /repos/{o}/{r}/contents/{path}` for a single file.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentPayload {
    pub path: String,
    pub sha: String,
}

impl From<ContentPayload> for RemoteFile {
    fn from(content: ContentPayload) -> Self {
        RemoteFile {
            path: content.path,
            sha: content.sha,
        }
    }
}
