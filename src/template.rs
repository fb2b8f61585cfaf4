//! Issue bodies and comments, rendered from the embedded Markdown templates.

use minijinja::{AutoEscape, Environment, context};

use crate::ticket::TicketRef;

const ISSUE_BODY: &str = include_str!("templates/issue-body.md.jinja");
const INSTRUCTIONS_COMMENT: &str = include_str!("templates/instructions-comment.md.jinja");
const MENTION_COMMENT: &str = include_str!("templates/mention-comment.md.jinja");

/// Shown under Requirements when the ticket has no description.
pub const EMPTY_DESCRIPTION: &str = "No description provided.";

fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.add_template("issue-body", ISSUE_BODY)?;
    env.add_template("instructions-comment", INSTRUCTIONS_COMMENT)?;
    env.add_template("mention-comment", MENTION_COMMENT)?;
    Ok(env)
}

/// Render the issue body for `ticket`.
///
/// Sections come in a fixed order: Requirements, Acceptance Criteria, Jira
/// Reference, footer. When `context_branch` is set the body also opens with
/// agent instructions and gains a Development section naming the branch.
pub fn compose_issue_body(
    ticket: &TicketRef,
    context_branch: Option<&str>,
    mention: &str,
) -> anyhow::Result<String> {
    let description = ticket.description.trim();
    let requirements = if description.is_empty() {
        EMPTY_DESCRIPTION
    } else {
        description
    };

    let env = environment()?;
    let rendered = env.get_template("issue-body")?.render(context! {
        ticket => ticket,
        requirements => requirements,
        branch => context_branch,
        mention => mention,
    })?;
    Ok(rendered)
}

/// Comment pointing the agent at the context branch and its docs.
pub fn render_instructions_comment(
    issue_number: u64,
    branch: &str,
    mention: &str,
) -> anyhow::Result<String> {
    let env = environment()?;
    let rendered = env.get_template("instructions-comment")?.render(context! {
        issue_number => issue_number,
        branch => branch,
        mention => mention,
    })?;
    Ok(rendered)
}

/// Body of the last-resort comment asking the agent to pick the issue up.
pub fn render_mention_comment(mention: &str, issue_number: u64) -> anyhow::Result<String> {
    let env = environment()?;
    let rendered = env.get_template("mention-comment")?.render(context! {
        issue_number => issue_number,
        mention => mention,
    })?;
    Ok(rendered)
}
