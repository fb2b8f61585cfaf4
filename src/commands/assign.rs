use tracing::{info, warn};

use crate::ci::CiReporter;
use crate::config::{AssignConfig, EnvSource, Settings};
use crate::error::ExitError;
use crate::github::{CodeHost, RemoteIssue};
use crate::template::render_instructions_comment;
use crate::workflow::assign::Orchestrator;

use super::create_issue::print_assignment;

/// `assign`: post branch instructions on an existing issue, then route it to
/// the agent. Fails only when neither the comment nor any strategy landed.
pub fn run_assign(env: &dyn EnvSource, settings: &Settings) -> anyhow::Result<()> {
    let config = AssignConfig::from_env(env, settings)?;
    let reporter = CiReporter::default();
    let repo = &config.target.repo;
    let agent = &settings.agent;

    println!("Target repository: {repo}");
    println!("Issue: #{}", config.issue_number);
    println!("Context branch: {}", config.context_branch);

    let client = super::connect(&config.target, settings);
    let issue = client
        .get_issue(repo, config.issue_number)
        .unwrap_or_else(|err| {
            warn!(issue = config.issue_number, error = %err, "fetching issue failed");
            RemoteIssue::unresolved(repo, config.issue_number)
        });

    let comment = render_instructions_comment(issue.number, &config.context_branch, &agent.mention)?;
    let instructed = match client.add_comment(repo, issue.number, &comment) {
        Ok(()) => {
            println!("Posted instructions on issue #{}", issue.number);
            true
        }
        Err(err) => {
            warn!(issue = issue.number, error = %err, "instructions comment failed");
            reporter.warning(
                "Instructions not posted",
                &format!("Could not comment on issue #{}: {err}", issue.number),
            );
            false
        }
    };

    if issue.assignees.iter().any(|a| agent.is_agent(&a.login)) {
        println!("@{} is already assigned", agent.assignee_login);
        return Ok(());
    }

    let outcome =
        Orchestrator::new(&client, repo, agent, &settings.assignment.strategies).assign(&issue);
    print_assignment(&issue, &outcome, settings, &reporter);
    info!(
        issue = issue.number,
        bound = outcome.is_bound(),
        instructed,
        "assign finished"
    );

    if !instructed && !outcome.is_notified() {
        return Err(ExitError::Unnotified {
            issue: issue.number,
        }
        .into());
    }
    Ok(())
}
