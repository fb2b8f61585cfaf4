use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use jira_relay::commands;
use jira_relay::config::{ProcessEnv, Settings};
use jira_relay::error::ExitError;
use jira_relay::telemetry;

#[derive(Debug, Parser)]
#[command(
    name = "jira-relay",
    version,
    about = "Mirror Jira tickets into GitHub issues and route them to a coding agent"
)]
struct Cli {
    /// Settings file (default: ./.jira-relay.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Publish the docs tree to the ticket's context branch
    SyncContext,
    /// Create (or find) the GitHub issue for the ticket and assign the agent
    CreateIssue,
    /// Post branch instructions on an issue and assign the agent
    Assign,
    /// Print the JSON Schema for .jira-relay.toml
    Schema,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::SyncContext => "sync-context",
            Self::CreateIssue => "create-issue",
            Self::Assign => "assign",
            Self::Schema => "schema",
        }
    }
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(cli.config.as_deref(), &cwd).map_err(|e| {
        match e.downcast::<ExitError>() {
            Ok(exit) => exit,
            Err(e) => ExitError::Config(format!("{e:#}")),
        }
    })?;
    Ok(settings)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::SyncContext => {
            commands::sync_context::run_sync_context(&ProcessEnv, &load_settings(cli)?)
        }
        Commands::CreateIssue => {
            commands::create_issue::run_create_issue(&ProcessEnv, &load_settings(cli)?)
        }
        Commands::Assign => commands::assign::run_assign(&ProcessEnv, &load_settings(cli)?),
        Commands::Schema => commands::schema::run_schema(),
    }
}

fn main() -> ExitCode {
    telemetry::init();

    let cli = Cli::parse();

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(exit_err) = e.downcast_ref::<ExitError>() {
                eprintln!("error: {exit_err}");
                exit_err.exit_code()
            } else {
                eprintln!("error: {e:?}");
                ExitCode::FAILURE
            }
        }
    }
}
