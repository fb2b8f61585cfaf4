//! Linking the context branch to an issue's Development section.

use tracing::{info, warn};

use crate::github::{CodeHost, GithubError, GithubResult, RemoteIssue, RepoRef};

/// Best effort: every failure is logged and reported as `false`.
pub fn link_issue_to_branch(
    host: &dyn CodeHost,
    repo: &RepoRef,
    issue: &RemoteIssue,
    branch: &str,
) -> bool {
    match try_link(host, repo, issue, branch) {
        Ok(()) => {
            info!(issue = issue.number, branch, "branch linked to issue");
            true
        }
        Err(err) => {
            warn!(issue = issue.number, branch, error = %err, "linking branch failed");
            false
        }
    }
}

fn try_link(
    host: &dyn CodeHost,
    repo: &RepoRef,
    issue: &RemoteIssue,
    branch: &str,
) -> GithubResult<()> {
    let repository_id = host.repository_id(repo)?;
    let issue_id = match &issue.node_id {
        Some(id) => id.clone(),
        None => host
            .get_issue(repo, issue.number)?
            .node_id
            .ok_or(GithubError::Missing("issue node id"))?,
    };
    let oid = host
        .branch_sha(repo, branch)?
        .ok_or(GithubError::Missing("branch head"))?;

    host.create_linked_branch(&repository_id, &issue_id, branch, &oid)
}
