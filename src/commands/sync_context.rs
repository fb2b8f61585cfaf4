use tracing::info;

use crate::ci::CiReporter;
use crate::config::{EnvSource, Settings, SyncContextConfig};
use crate::error::ExitError;
use crate::workflow::publish::{BranchStatus, collect_docs, ensure_branch, push_docs};

/// `sync-context`: publish the local docs tree to the ticket's context branch.
/// Exports `CONTEXT_BRANCH`.
pub fn run_sync_context(env: &dyn EnvSource, settings: &Settings) -> anyhow::Result<()> {
    let config = SyncContextConfig::from_env(env, settings)?;
    let reporter = CiReporter::new(config.env_file.clone());
    let repo = &config.target.repo;
    let branch = config.branch_name();

    println!("Target repository: {repo}");
    println!("Jira issue: {}", config.ticket_key);
    println!("Context branch: {branch}");

    let client = super::connect(&config.target, settings);
    match ensure_branch(&client, repo, &branch) {
        Ok(BranchStatus::Created) => println!("Created branch {branch}"),
        Ok(BranchStatus::Existing) => println!("Branch {branch} already exists"),
        Err(err) => {
            return Err(ExitError::ContextSync(format!("could not create {branch}: {err}")).into());
        }
    }

    let docs_dir = config.agent_repo_path.join(&settings.docs.dir);
    let docs = collect_docs(&docs_dir, &settings.docs.extension)
        .map_err(|err| ExitError::ContextSync(format!("{err:#}")))?;
    if docs.is_empty() {
        return Err(ExitError::ContextSync(format!(
            "no .{} files found under {}",
            settings.docs.extension,
            docs_dir.display()
        ))
        .into());
    }
    println!("Found {} documentation files", docs.len());

    let report = push_docs(&client, repo, &branch, &config.ticket_key, &docs);
    for path in &report.synced {
        println!("  synced {path}");
    }
    if report.synced.is_empty() {
        return Err(ExitError::ContextSync("no files were synced".into()).into());
    }
    if !report.failed.is_empty() {
        reporter.warning(
            "Some docs not synced",
            &format!("Failed to sync: {}", report.failed.join(", ")),
        );
    }

    println!(
        "Synced {}/{} files to {branch}",
        report.synced.len(),
        docs.len()
    );
    reporter.export("CONTEXT_BRANCH", &branch)?;
    info!(branch = %branch, synced = report.synced.len(), "sync-context finished");
    Ok(())
}
