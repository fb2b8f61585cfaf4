use tracing::info;

use crate::ci::CiReporter;
use crate::config::{CreateIssueConfig, EnvSource, Settings};
use crate::github::RemoteIssue;
use crate::workflow::assign::{AssignmentOutcome, Strategy};
use crate::workflow::create::CreatedVia;
use crate::workflow::{CreationReport, RelayRequest, RelayResult, relay_ticket};

/// `create-issue`: mirror the Jira ticket into a GitHub issue and route it to
/// the agent. Exports `ISSUE_NUMBER`.
pub fn run_create_issue(env: &dyn EnvSource, settings: &Settings) -> anyhow::Result<()> {
    let config = CreateIssueConfig::from_env(env, settings)?;
    let reporter = CiReporter::new(config.env_file.clone());

    println!("Target repository: {}", config.target.repo);
    println!("Jira issue: {}", config.ticket.key);
    if let Some(branch) = &config.context_branch {
        println!("Context branch: {branch}");
    }

    let client = super::connect(&config.target, settings);
    let request = RelayRequest {
        repo: &config.target.repo,
        ticket: &config.ticket,
        context_branch: config.context_branch.as_deref(),
        settings,
    };
    let result = relay_ticket(&client, &request)?;

    match &result {
        RelayResult::Existing(issue) => {
            println!(
                "Issue #{} already exists for {}: {}",
                issue.number, config.ticket.key, issue.url
            );
            reporter.notice(
                "Existing issue",
                &format!("{} is already tracked by {}", config.ticket.key, issue.url),
            );
        }
        RelayResult::Created(report) => print_created(report, settings, &reporter),
    }

    let number = result.issue().number.to_string();
    reporter.export("ISSUE_NUMBER", &number)?;
    info!(issue = %number, "create-issue finished");
    Ok(())
}

fn print_created(report: &CreationReport, settings: &Settings, reporter: &CiReporter) {
    let issue = &report.created.issue;
    let via = match report.created.via {
        CreatedVia::TypedMutation => "GraphQL",
        CreatedVia::Rest => "REST",
        CreatedVia::RestWithoutAssignee => "REST, without assignee",
    };
    println!("Created issue #{} ({via}): {}", issue.number, issue.url);

    if report.linked == Some(false) {
        reporter.warning(
            "Branch not linked",
            &format!("Issue #{} could not be linked to its context branch", issue.number),
        );
    }

    match &report.assignment {
        None => println!("Assigned to @{} at creation", settings.agent.assignee_login),
        Some(outcome) => print_assignment(issue, outcome, settings, reporter),
    }
}

/// Report an orchestrator outcome, with manual steps when the agent is not
/// bound.
pub(crate) fn print_assignment(
    issue: &RemoteIssue,
    outcome: &AssignmentOutcome,
    settings: &Settings,
    reporter: &CiReporter,
) {
    for attempt in &outcome.attempts {
        println!("  {}: {:?}", attempt.strategy, attempt.result);
    }

    match (&outcome.bound, outcome.method) {
        (Some(identity), Some(method)) => {
            println!("Assigned to @{} via {method}", identity.login);
        }
        (None, Some(Strategy::CommentMention)) => reporter.warning(
            "Agent not assigned",
            &format!(
                "@{} was mentioned on issue #{} but not assigned. {}",
                settings.agent.mention,
                issue.number,
                manual_steps(issue, settings)
            ),
        ),
        _ => reporter.warning(
            "Agent not assigned",
            &format!(
                "No assignment strategy succeeded for issue #{}. {}",
                issue.number,
                manual_steps(issue, settings)
            ),
        ),
    }
}

fn manual_steps(issue: &RemoteIssue, settings: &Settings) -> String {
    format!(
        "Open {} and assign @{} from the Assignees menu.",
        issue.url, settings.agent.assignee_login
    )
}
