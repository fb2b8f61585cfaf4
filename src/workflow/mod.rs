//! The relay workflow: duplicate check, issue creation, branch linking and
//! agent assignment, wired together over a [`CodeHost`].

pub mod assign;
pub mod create;
pub mod duplicate;
pub mod link;
pub mod publish;

use tracing::info;

use crate::config::Settings;
use crate::error::ExitError;
use crate::github::{CodeHost, RemoteIssue, RepoRef};
use crate::template::compose_issue_body;
use crate::ticket::TicketRef;

use assign::{AssignmentOutcome, Orchestrator};
use create::{CreatedIssue, IssueDraft};

/// Label added when the issue points at a context branch.
pub const CONTEXT_LABEL: &str = "has-context";

pub struct RelayRequest<'a> {
    pub repo: &'a RepoRef,
    pub ticket: &'a TicketRef,
    pub context_branch: Option<&'a str>,
    pub settings: &'a Settings,
}

#[derive(Debug)]
pub enum RelayResult {
    /// An open issue already references the ticket; nothing was created.
    Existing(RemoteIssue),
    Created(CreationReport),
}

impl RelayResult {
    pub const fn issue(&self) -> &RemoteIssue {
        match self {
            Self::Existing(issue) => issue,
            Self::Created(report) => &report.created.issue,
        }
    }
}

#[derive(Debug)]
pub struct CreationReport {
    pub created: CreatedIssue,
    /// Whether the context branch was linked; `None` without a branch.
    pub linked: Option<bool>,
    /// `None` when creation already bound the agent.
    pub assignment: Option<AssignmentOutcome>,
}

impl CreationReport {
    pub fn agent_bound(&self) -> bool {
        self.assignment
            .as_ref()
            .is_none_or(AssignmentOutcome::is_bound)
    }
}

/// Labels for a new issue: the configured ones, the priority label, and
/// [`CONTEXT_LABEL`] when a branch is attached.
pub fn issue_labels(settings: &Settings, ticket: &TicketRef, has_branch: bool) -> Vec<String> {
    let mut labels = settings.labels.clone();
    labels.push(ticket.priority_label());
    if has_branch {
        labels.push(CONTEXT_LABEL.to_string());
    }
    labels
}

/// Mirror `ticket` into `repo` unless an open issue already carries its key.
pub fn relay_ticket(host: &dyn CodeHost, request: &RelayRequest<'_>) -> anyhow::Result<RelayResult> {
    let RelayRequest {
        repo,
        ticket,
        context_branch,
        settings,
    } = *request;

    if let Some(existing) = duplicate::find_open_issue(host, repo, &ticket.key) {
        info!(issue = existing.number, ticket = %ticket.key, "open issue already exists");
        return Ok(RelayResult::Existing(existing));
    }

    let draft = IssueDraft {
        title: ticket.title(),
        body: compose_issue_body(ticket, context_branch, &settings.agent.mention)?,
        labels: issue_labels(settings, ticket, context_branch.is_some()),
    };

    let created = create::create_issue(host, repo, &settings.agent, &draft).map_err(|err| {
        ExitError::IssueCreation {
            ticket: ticket.key.clone(),
            message: err.to_string(),
        }
    })?;

    let linked =
        context_branch.map(|branch| link::link_issue_to_branch(host, repo, &created.issue, branch));

    let already_bound = created
        .issue
        .assignees
        .iter()
        .any(|a| settings.agent.is_agent(&a.login));
    let assignment = if already_bound {
        info!(issue = created.issue.number, "agent bound at creation");
        None
    } else {
        let orchestrator = Orchestrator::new(
            host,
            repo,
            &settings.agent,
            &settings.assignment.strategies,
        );
        Some(orchestrator.assign(&created.issue))
    };

    Ok(RelayResult::Created(CreationReport {
        created,
        linked,
        assignment,
    }))
}
