//! Issue creation.
//!
//! The GraphQL `createIssue` path binds the agent atomically and is tried
//! first. Any failure there falls back to REST, where a 422 naming
//! `assignees` gets exactly one retry with the assignee dropped.

use tracing::{info, warn};

use crate::config::AgentProfile;
use crate::github::{
    CodeHost, CreateIssueInput, GithubError, GithubResult, NewIssue, RemoteIssue, RepoRef,
};

use super::assign::resolve_agent_identity;

/// What to create, independent of transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatedVia {
    /// GraphQL `createIssue` with the agent as assignee.
    TypedMutation,
    /// REST with the agent login as assignee.
    Rest,
    /// REST retried without assignees after a 422.
    RestWithoutAssignee,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub issue: RemoteIssue,
    pub via: CreatedVia,
}

pub fn create_issue(
    host: &dyn CodeHost,
    repo: &RepoRef,
    agent: &AgentProfile,
    draft: &IssueDraft,
) -> GithubResult<CreatedIssue> {
    match create_typed(host, repo, agent, draft) {
        Ok(issue) => {
            info!(issue = issue.number, "issue created via GraphQL");
            return Ok(CreatedIssue {
                issue,
                via: CreatedVia::TypedMutation,
            });
        }
        Err(err) => warn!(error = %err, "GraphQL issue creation unavailable, using REST"),
    }

    create_rest(host, repo, agent, draft)
}

fn create_typed(
    host: &dyn CodeHost,
    repo: &RepoRef,
    agent: &AgentProfile,
    draft: &IssueDraft,
) -> GithubResult<RemoteIssue> {
    let identity =
        resolve_agent_identity(host, repo, agent).ok_or(GithubError::Missing("agent actor"))?;
    let repository_id = host.repository_id(repo)?;

    let issue = host.create_issue_typed(&CreateIssueInput {
        repository_id,
        title: draft.title.clone(),
        body: draft.body.clone(),
        assignee_ids: vec![identity.opaque_id],
    })?;

    if !draft.labels.is_empty()
        && let Err(err) = host.add_labels(repo, issue.number, &draft.labels)
    {
        warn!(issue = issue.number, error = %err, "adding labels failed");
    }
    Ok(issue)
}

fn create_rest(
    host: &dyn CodeHost,
    repo: &RepoRef,
    agent: &AgentProfile,
    draft: &IssueDraft,
) -> GithubResult<CreatedIssue> {
    let payload = NewIssue {
        title: draft.title.clone(),
        body: draft.body.clone(),
        labels: draft.labels.clone(),
        assignees: vec![agent.assignee_login.clone()],
    };

    match host.create_issue(repo, &payload) {
        Ok(issue) => {
            info!(issue = issue.number, "issue created via REST");
            Ok(CreatedIssue {
                issue,
                via: CreatedVia::Rest,
            })
        }
        Err(err) if err.is_unassignable() => {
            warn!(
                login = %agent.assignee_login,
                "agent not assignable, retrying without assignees"
            );
            let issue = host.create_issue(repo, &payload.without_assignees())?;
            info!(issue = issue.number, "issue created without assignee");
            Ok(CreatedIssue {
                issue,
                via: CreatedVia::RestWithoutAssignee,
            })
        }
        Err(err) => Err(err),
    }
}
