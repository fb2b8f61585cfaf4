//! GitHub access for the relay.
//!
//! [`CodeHost`] is the boundary between the workflow and GitHub. The live
//! implementation is [`GithubClient`]; workflow tests use a recording fake.
//! Every response is decoded into the typed records below before the workflow
//! sees it.

pub mod adapters;
pub mod client;
pub mod graphql;

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;

use serde::Serialize;

pub use client::GithubClient;

/// `owner/name` coordinates of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    /// Parse an `owner/name` slug.
    pub fn parse(raw: &str) -> Option<Self> {
        let (owner, name) = raw.trim().split_once('/')?;
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("open") {
            IssueState::Open
        } else {
            IssueState::Closed
        }
    }
}

/// An actor on GitHub: its login plus the node id GraphQL needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    pub login: String,
    pub opaque_id: String,
}

/// An issue as GitHub reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIssue {
    pub number: u64,
    /// GraphQL node id. Absent when the source response did not carry it.
    pub node_id: Option<String>,
    pub url: String,
    pub title: String,
    pub state: IssueState,
    pub assignees: Vec<AgentIdentity>,
    pub labels: Vec<String>,
}

impl RemoteIssue {
    /// Placeholder for an issue we only know by number.
    pub fn unresolved(repo: &RepoRef, number: u64) -> Self {
        Self {
            number,
            node_id: None,
            url: format!("https://github.com/{}/issues/{number}", repo.slug()),
            title: String::new(),
            state: IssueState::Open,
            assignees: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn assignee_logins(&self) -> Vec<&str> {
        self.assignees.iter().map(|a| a.login.as_str()).collect()
    }
}

/// REST payload for `POST /repos/{o}/{r}/issues`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
}

impl NewIssue {
    /// The same payload with the `assignees` field dropped.
    pub fn without_assignees(&self) -> Self {
        Self {
            assignees: Vec::new(),
            ..self.clone()
        }
    }
}

/// GraphQL `CreateIssueInput`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueInput {
    pub repository_id: String,
    pub title: String,
    pub body: String,
    pub assignee_ids: Vec<String>,
}

/// A file as stored on a branch, only the parts we need to update it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub sha: String,
}

/// REST payload for `PUT /repos/{o}/{r}/contents/{path}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutFile {
    #[serde(skip)]
    pub path: String,
    pub message: String,
    /// Base64-encoded file content.
    pub content: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Failures talking to GitHub.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GithubError {
    #[error("request failed: {0}")]
    Transport(String),

    /// `body` holds the full response; only the message is truncated.
    #[error("GitHub returned {status}: {}", truncate(body, MAX_ERROR_BODY))]
    Status { status: u16, body: String },

    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("response did not include {0}")]
    Missing(&'static str),
}

impl GithubError {
    /// A 422 rejecting the requested assignees.
    pub fn is_unassignable(&self) -> bool {
        matches!(self, GithubError::Status { status: 422, body } if body.contains("assignees"))
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, GithubError::Status { status: 404, .. })
    }

    pub const fn is_unprocessable(&self) -> bool {
        matches!(self, GithubError::Status { status: 422, .. })
    }
}

pub type GithubResult<T> = Result<T, GithubError>;

const MAX_ERROR_BODY: usize = 2000;

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

/// Operations the relay needs from the code host.
///
/// Methods map one-to-one onto REST endpoints or GraphQL documents and do not
/// retry. Non-2xx statuses surface as [`GithubError::Status`].
pub trait CodeHost {
    /// `GET /search/issues?q=...&per_page=...`, items in platform order.
    fn search_issues(&self, query: &str, per_page: u32) -> GithubResult<Vec<RemoteIssue>>;

    fn get_issue(&self, repo: &RepoRef, number: u64) -> GithubResult<RemoteIssue>;

    /// `POST /repos/{o}/{r}/issues`.
    fn create_issue(&self, repo: &RepoRef, issue: &NewIssue) -> GithubResult<RemoteIssue>;

    /// GraphQL `createIssue`.
    fn create_issue_typed(&self, input: &CreateIssueInput) -> GithubResult<RemoteIssue>;

    fn add_comment(&self, repo: &RepoRef, number: u64, body: &str) -> GithubResult<()>;

    /// `POST .../assignees`; additive. Returns the issue as updated.
    fn add_assignees(
        &self,
        repo: &RepoRef,
        number: u64,
        logins: &[String],
    ) -> GithubResult<RemoteIssue>;

    fn add_labels(&self, repo: &RepoRef, number: u64, labels: &[String]) -> GithubResult<()>;

    /// Actors with the `CAN_BE_ASSIGNED` capability on the repository.
    fn suggested_actors(&self, repo: &RepoRef) -> GithubResult<Vec<AgentIdentity>>;

    fn repository_id(&self, repo: &RepoRef) -> GithubResult<String>;

    /// GraphQL `replaceActorsForAssignable`. Replaces the whole assignee set
    /// with `actor_ids` and returns the resulting assignee logins.
    fn replace_actors(&self, assignable_id: &str, actor_ids: &[String])
    -> GithubResult<Vec<String>>;

    /// GraphQL `createLinkedBranch`; `oid` is the commit the branch points at.
    fn create_linked_branch(
        &self,
        repository_id: &str,
        issue_id: &str,
        branch: &str,
        oid: &str,
    ) -> GithubResult<()>;

    fn default_branch(&self, repo: &RepoRef) -> GithubResult<String>;

    /// Head sha of `refs/heads/{branch}`, `None` when the branch does not exist.
    fn branch_sha(&self, repo: &RepoRef, branch: &str) -> GithubResult<Option<String>>;

    fn create_branch(&self, repo: &RepoRef, branch: &str, sha: &str) -> GithubResult<()>;

    /// Existing file on `branch`, `None` on 404.
    fn get_file(&self, repo: &RepoRef, path: &str, branch: &str)
    -> GithubResult<Option<RemoteFile>>;

    fn put_file(&self, repo: &RepoRef, file: &PutFile) -> GithubResult<()>;
}
