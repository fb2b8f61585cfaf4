//! Routing an issue to the coding agent.
//!
//! Agent assignment APIs are unevenly available, so [`Orchestrator`] walks an
//! ordered list of [`Strategy`] values and stops at the first that lands.
//! `comment-mention` is terminal: once it has run, nothing after it is tried.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AgentProfile;
use crate::github::{AgentIdentity, CodeHost, RemoteIssue, RepoRef};
use crate::template;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// REST assignee endpoint with the agent's login.
    DirectLogin,
    /// Resolve the agent's node id, then `replaceActorsForAssignable`.
    OpaqueIdMutation,
    /// Comment mentioning the agent.
    CommentMention,
}

impl Strategy {
    pub const DEFAULT_ORDER: [Self; 3] = [
        Self::DirectLogin,
        Self::OpaqueIdMutation,
        Self::CommentMention,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DirectLogin => "direct-login",
            Self::OpaqueIdMutation => "opaque-id-mutation",
            Self::CommentMention => "comment-mention",
        }
    }

    const fn is_terminal(self) -> bool {
        matches!(self, Self::CommentMention)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentAttempt {
    pub strategy: Strategy,
    pub result: AttemptResult,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentOutcome {
    /// The agent bound as an assignee, when a binding strategy succeeded.
    pub bound: Option<AgentIdentity>,
    /// Strategy that succeeded; `comment-mention` means notified, not bound.
    pub method: Option<Strategy>,
    pub attempts: Vec<AssignmentAttempt>,
}

impl AssignmentOutcome {
    pub const fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    pub const fn is_notified(&self) -> bool {
        self.method.is_some()
    }

    pub fn attempted(&self, strategy: Strategy) -> bool {
        self.attempts.iter().any(|a| a.strategy == strategy)
    }
}

/// Find the agent among the actors assignable in `repo`. Lookup failures are
/// logged and read as "not found".
pub fn resolve_agent_identity(
    host: &dyn CodeHost,
    repo: &RepoRef,
    agent: &AgentProfile,
) -> Option<AgentIdentity> {
    match host.suggested_actors(repo) {
        Ok(actors) => {
            let found = actors.into_iter().find(|a| agent.is_agent(&a.login));
            if found.is_none() {
                info!(repo = %repo, "agent is not among the assignable actors");
            }
            found
        }
        Err(err) => {
            warn!(repo = %repo, error = %err, "assignable actor lookup failed");
            None
        }
    }
}

pub struct Orchestrator<'a> {
    host: &'a dyn CodeHost,
    repo: &'a RepoRef,
    agent: &'a AgentProfile,
    strategies: &'a [Strategy],
}

/// What a single strategy achieved.
enum Step {
    Bound(AgentIdentity),
    Notified,
    Failed,
}

impl<'a> Orchestrator<'a> {
    pub const fn new(
        host: &'a dyn CodeHost,
        repo: &'a RepoRef,
        agent: &'a AgentProfile,
        strategies: &'a [Strategy],
    ) -> Self {
        Self {
            host,
            repo,
            agent,
            strategies,
        }
    }

    /// Try each strategy in order until one succeeds. Never fails; the
    /// outcome records what was attempted.
    pub fn assign(&self, issue: &RemoteIssue) -> AssignmentOutcome {
        let mut outcome = AssignmentOutcome::default();

        for &strategy in self.strategies {
            debug!(issue = issue.number, %strategy, "trying assignment strategy");
            let step = match strategy {
                Strategy::DirectLogin => self.direct_login(issue),
                Strategy::OpaqueIdMutation => self.opaque_id_mutation(issue),
                Strategy::CommentMention => self.comment_mention(issue),
            };

            let result = if matches!(step, Step::Failed) {
                AttemptResult::Failure
            } else {
                AttemptResult::Success
            };
            outcome.attempts.push(AssignmentAttempt { strategy, result });

            match step {
                Step::Bound(identity) => {
                    info!(issue = issue.number, %strategy, login = %identity.login, "agent assigned");
                    outcome.bound = Some(identity);
                    outcome.method = Some(strategy);
                    return outcome;
                }
                Step::Notified => {
                    info!(issue = issue.number, %strategy, "agent notified by comment");
                    outcome.method = Some(strategy);
                    return outcome;
                }
                Step::Failed if strategy.is_terminal() => return outcome,
                Step::Failed => {}
            }
        }

        outcome
    }

    fn direct_login(&self, issue: &RemoteIssue) -> Step {
        let login = self.agent.assignee_login.clone();
        match self
            .host
            .add_assignees(self.repo, issue.number, std::slice::from_ref(&login))
        {
            Ok(updated) => match updated
                .assignees
                .into_iter()
                .find(|a| self.agent.is_agent(&a.login))
            {
                Some(identity) => Step::Bound(identity),
                None => {
                    info!(
                        issue = issue.number,
                        login = %login,
                        "assignee request accepted but agent not among assignees"
                    );
                    Step::Failed
                }
            },
            Err(err) => {
                warn!(issue = issue.number, error = %err, "direct assignment failed");
                Step::Failed
            }
        }
    }

    fn opaque_id_mutation(&self, issue: &RemoteIssue) -> Step {
        let Some(identity) = resolve_agent_identity(self.host, self.repo, self.agent) else {
            return Step::Failed;
        };

        let node_id = match &issue.node_id {
            Some(id) => id.clone(),
            None => match self.host.get_issue(self.repo, issue.number) {
                Ok(RemoteIssue {
                    node_id: Some(id), ..
                }) => id,
                Ok(_) => {
                    warn!(issue = issue.number, "issue has no node id");
                    return Step::Failed;
                }
                Err(err) => {
                    warn!(issue = issue.number, error = %err, "fetching issue node id failed");
                    return Step::Failed;
                }
            },
        };

        match self
            .host
            .replace_actors(&node_id, std::slice::from_ref(&identity.opaque_id))
        {
            Ok(logins) if logins.iter().any(|l| self.agent.is_agent(l)) => Step::Bound(identity),
            Ok(logins) => {
                info!(issue = issue.number, ?logins, "mutation did not bind the agent");
                Step::Failed
            }
            Err(err) => {
                warn!(issue = issue.number, error = %err, "actor replacement failed");
                Step::Failed
            }
        }
    }

    fn comment_mention(&self, issue: &RemoteIssue) -> Step {
        let body = match template::render_mention_comment(&self.agent.mention, issue.number) {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "rendering mention comment failed");
                return Step::Failed;
            }
        };
        match self.host.add_comment(self.repo, issue.number, &body) {
            Ok(()) => Step::Notified,
            Err(err) => {
                warn!(issue = issue.number, error = %err, "mention comment failed");
                Step::Failed
            }
        }
    }
}
