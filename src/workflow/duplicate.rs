//! Finding an open issue that already carries a ticket key.

use tracing::{debug, warn};

use crate::github::{CodeHost, IssueState, RemoteIssue, RepoRef};

pub fn search_query(repo: &RepoRef, ticket_key: &str) -> String {
    format!("repo:{} {ticket_key} in:title,body type:issue state:open", repo.slug())
}

/// First open issue in `repo` mentioning `ticket_key`, in search relevance
/// order. A failed search is logged and reads as "no duplicate".
pub fn find_open_issue(
    host: &dyn CodeHost,
    repo: &RepoRef,
    ticket_key: &str,
) -> Option<RemoteIssue> {
    let query = search_query(repo, ticket_key);
    debug!(%query, "searching for an existing issue");

    match host.search_issues(&query, 1) {
        Ok(items) => items.into_iter().find(|i| i.state == IssueState::Open),
        Err(err) => {
            warn!(ticket = ticket_key, error = %err, "duplicate search failed, assuming none");
            None
        }
    }
}
