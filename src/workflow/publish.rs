//! Mirroring the local docs tree onto the context branch.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, warn};

use crate::github::{CodeHost, GithubError, GithubResult, PutFile, RepoRef};

/// Prefix of every published path in the target repository.
pub const REMOTE_DOCS_ROOT: &str = "docs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStatus {
    Existing,
    Created,
}

/// Make sure `branch` exists, cutting it from the default branch if needed.
pub fn ensure_branch(
    host: &dyn CodeHost,
    repo: &RepoRef,
    branch: &str,
) -> GithubResult<BranchStatus> {
    let base = host.default_branch(repo).unwrap_or_else(|err| {
        warn!(error = %err, "default branch lookup failed, using main");
        "main".to_string()
    });

    match host.branch_sha(repo, branch) {
        Ok(Some(_)) => {
            info!(branch, "context branch already exists");
            return Ok(BranchStatus::Existing);
        }
        Ok(None) => {}
        Err(err) => warn!(branch, error = %err, "branch lookup failed, trying to create it"),
    }

    let sha = host
        .branch_sha(repo, &base)?
        .ok_or(GithubError::Missing("base branch head"))?;

    match host.create_branch(repo, branch, &sha) {
        Ok(()) => {
            info!(branch, base = %base, "context branch created");
            Ok(BranchStatus::Created)
        }
        Err(err) if err.is_unprocessable() => {
            info!(branch, "context branch appeared concurrently");
            Ok(BranchStatus::Existing)
        }
        Err(err) => Err(err),
    }
}

/// A local doc and where it lands on the branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocFile {
    pub local: PathBuf,
    pub remote: String,
}

/// Every `*.{extension}` file under `docs_dir`, recursively, sorted by
/// remote path.
pub fn collect_docs(docs_dir: &Path, extension: &str) -> anyhow::Result<Vec<DocFile>> {
    if !docs_dir.is_dir() {
        bail!("docs directory not found at {}", docs_dir.display());
    }

    let mut files = Vec::new();
    walk(docs_dir, docs_dir, extension, &mut files)?;
    files.sort_by(|a, b| a.remote.cmp(&b.remote));
    Ok(files)
}

fn walk(root: &Path, dir: &Path, extension: &str, out: &mut Vec<DocFile>) -> anyhow::Result<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            walk(root, &path, extension, out)?;
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let relative = path.strip_prefix(root)?;
        let mut remote = String::from(REMOTE_DOCS_ROOT);
        for component in relative.components() {
            remote.push('/');
            remote.push_str(&component.as_os_str().to_string_lossy());
        }
        out.push(DocFile {
            local: path,
            remote,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: Vec<String>,
    pub failed: Vec<String>,
}

/// Upload each doc to `branch`. Per-file failures are collected in the
/// report.
pub fn push_docs(
    host: &dyn CodeHost,
    repo: &RepoRef,
    branch: &str,
    ticket_key: &str,
    docs: &[DocFile],
) -> SyncReport {
    let mut report = SyncReport::default();
    for doc in docs {
        match push_doc(host, repo, branch, ticket_key, doc) {
            Ok(()) => report.synced.push(doc.remote.clone()),
            Err(err) => {
                warn!(path = %doc.remote, error = %err, "pushing doc failed");
                report.failed.push(doc.remote.clone());
            }
        }
    }
    report
}

fn push_doc(
    host: &dyn CodeHost,
    repo: &RepoRef,
    branch: &str,
    ticket_key: &str,
    doc: &DocFile,
) -> anyhow::Result<()> {
    let bytes = std::fs::read(&doc.local)
        .with_context(|| format!("reading {}", doc.local.display()))?;

    let sha = match host.get_file(repo, &doc.remote, branch) {
        Ok(existing) => existing.map(|f| f.sha),
        Err(err) => {
            warn!(path = %doc.remote, error = %err, "existing file lookup failed, creating");
            None
        }
    };
    debug!(path = %doc.remote, update = sha.is_some(), "pushing doc");

    host.put_file(
        repo,
        &PutFile {
            path: doc.remote.clone(),
            message: format!("Sync project context: {} for {ticket_key}", doc.remote),
            content: STANDARD.encode(bytes),
            branch: branch.to_string(),
            sha,
        },
    )?;
    Ok(())
}
