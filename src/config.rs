use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ExitError;
use crate::github::RepoRef;
use crate::github::client::DEFAULT_API_BASE;
use crate::ticket::{DEFAULT_ISSUE_TYPE, DEFAULT_PRIORITY, TicketRef};
use crate::workflow::assign::Strategy;

/// Settings file looked up in the working directory when `--config` is absent.
pub const SETTINGS_FILE: &str = ".jira-relay.toml";

/// Tuning knobs from `.jira-relay.toml`. Every field has a default, so the
/// file is optional.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Settings {
    /// REST base URL. `GITHUB_API_URL` takes precedence.
    pub api_base: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Labels put on every created issue, before the priority label.
    pub labels: Vec<String>,
    pub agent: AgentProfile,
    pub assignment: AssignmentConfig,
    pub docs: DocsConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: None,
            timeout_secs: 10,
            labels: vec!["jira-sync".into(), "copilot-agent".into()],
            agent: AgentProfile::default(),
            assignment: AssignmentConfig::default(),
            docs: DocsConfig::default(),
        }
    }
}

/// How the coding agent shows up on GitHub.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AgentProfile {
    /// Login reported by the assignable-actors query.
    pub actor_login: String,
    /// Login the REST assignees endpoint accepts.
    pub assignee_login: String,
    /// Handle mentioned in comments, without `@`.
    pub mention: String,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            actor_login: "copilot-swe-agent".into(),
            assignee_login: "Copilot".into(),
            mention: "copilot".into(),
        }
    }
}

impl AgentProfile {
    /// Whether `login` names the agent under either of its logins.
    pub fn is_agent(&self, login: &str) -> bool {
        login.eq_ignore_ascii_case(&self.actor_login)
            || login.eq_ignore_ascii_case(&self.assignee_login)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AssignmentConfig {
    /// Strategies tried in order until one succeeds.
    pub strategies: Vec<Strategy>,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            strategies: Strategy::DEFAULT_ORDER.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DocsConfig {
    /// Docs directory, relative to `AGENT_REPO_PATH`.
    pub dir: PathBuf,
    /// Extension of the files to publish.
    pub extension: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("docs"),
            extension: "md".into(),
        }
    }
}

impl Settings {
    /// Load settings from `explicit`, or from `.jira-relay.toml` in `cwd` when
    /// present, or fall back to defaults.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ExitError::Config(format!(
                        "settings file {} does not exist",
                        path.display()
                    ))
                    .into());
                }
                path.to_path_buf()
            }
            None => {
                let candidate = cwd.join(SETTINGS_FILE);
                if !candidate.exists() {
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let settings: Self = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ExitError> {
        if self.timeout_secs == 0 {
            return Err(ExitError::Config("timeout_secs must be positive".into()));
        }
        if self.assignment.strategies.is_empty() {
            return Err(ExitError::Config(
                "assignment.strategies must name at least one strategy".into(),
            ));
        }
        Ok(())
    }
}

// --- Environment ---

/// Source of environment variables; the process environment in production,
/// a map in tests.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Reads variables and collects the names of required ones that are missing,
/// so a single error can list them all.
struct EnvReader<'a> {
    env: &'a dyn EnvSource,
    missing: Vec<&'static str>,
}

impl<'a> EnvReader<'a> {
    fn new(env: &'a dyn EnvSource) -> Self {
        Self {
            env,
            missing: Vec::new(),
        }
    }

    /// Non-blank value, trimmed.
    fn optional(&self, name: &str) -> Option<String> {
        self.env
            .var(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Value kept verbatim (descriptions keep their layout).
    fn raw_or_empty(&self, name: &str) -> String {
        self.env.var(name).unwrap_or_default()
    }

    fn or_default(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_string())
    }

    fn required(&mut self, name: &'static str) -> String {
        self.optional(name).unwrap_or_else(|| {
            self.missing.push(name);
            String::new()
        })
    }

    fn finish(self) -> Result<(), ExitError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ExitError::missing_vars(&self.missing))
        }
    }
}

/// Where and as whom to talk to GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubTarget {
    pub repo: RepoRef,
    pub token: String,
    pub api_base: String,
}

fn read_target(reader: &mut EnvReader<'_>, settings: &Settings) -> GithubTarget {
    let token = reader.required("GITHUB_TOKEN");

    let owner = reader.optional("TARGET_REPO_OWNER");
    let name = reader.optional("TARGET_REPO_NAME");
    let repo = match (owner, name) {
        (Some(owner), Some(name)) => RepoRef::new(&owner, &name),
        (None, None) => reader
            .optional("GITHUB_REPOSITORY")
            .and_then(|slug| RepoRef::parse(&slug))
            .unwrap_or_else(|| {
                reader.missing.push("TARGET_REPO_OWNER");
                reader.missing.push("TARGET_REPO_NAME");
                RepoRef::new("", "")
            }),
        (owner, name) => {
            if owner.is_none() {
                reader.missing.push("TARGET_REPO_OWNER");
            }
            if name.is_none() {
                reader.missing.push("TARGET_REPO_NAME");
            }
            RepoRef::new(
                owner.as_deref().unwrap_or_default(),
                name.as_deref().unwrap_or_default(),
            )
        }
    };

    let api_base = reader
        .optional("GITHUB_API_URL")
        .or_else(|| settings.api_base.clone())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    GithubTarget {
        repo,
        token,
        api_base,
    }
}

fn read_ticket(reader: &mut EnvReader<'_>) -> TicketRef {
    TicketRef {
        key: reader.required("JIRA_ISSUE_KEY"),
        summary: reader.optional("JIRA_SUMMARY").unwrap_or_default(),
        description: reader.raw_or_empty("JIRA_DESCRIPTION"),
        priority: reader.or_default("JIRA_PRIORITY", DEFAULT_PRIORITY),
        issue_type: reader.or_default("JIRA_ISSUE_TYPE", DEFAULT_ISSUE_TYPE),
        url: reader.optional("JIRA_ISSUE_URL").unwrap_or_default(),
    }
}

/// Inputs of `create-issue`.
#[derive(Debug, Clone)]
pub struct CreateIssueConfig {
    pub target: GithubTarget,
    pub ticket: TicketRef,
    pub context_branch: Option<String>,
    pub env_file: Option<PathBuf>,
}

impl CreateIssueConfig {
    pub fn from_env(env: &dyn EnvSource, settings: &Settings) -> Result<Self, ExitError> {
        let mut reader = EnvReader::new(env);
        let target = read_target(&mut reader, settings);
        let ticket = read_ticket(&mut reader);
        let context_branch = reader.optional("CONTEXT_BRANCH");
        let env_file = reader.optional("GITHUB_ENV").map(PathBuf::from);
        reader.finish()?;
        Ok(Self {
            target,
            ticket,
            context_branch,
            env_file,
        })
    }
}

/// Inputs of `assign`.
#[derive(Debug, Clone)]
pub struct AssignConfig {
    pub target: GithubTarget,
    pub issue_number: u64,
    pub context_branch: String,
}

impl AssignConfig {
    pub fn from_env(env: &dyn EnvSource, settings: &Settings) -> Result<Self, ExitError> {
        let mut reader = EnvReader::new(env);
        let target = read_target(&mut reader, settings);
        let raw_number = reader.required("ISSUE_NUMBER");
        let context_branch = reader.required("CONTEXT_BRANCH");
        reader.finish()?;

        let issue_number = raw_number
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ExitError::Config(format!(
                    "ISSUE_NUMBER must be a positive integer, got {raw_number:?}"
                ))
            })?;

        Ok(Self {
            target,
            issue_number,
            context_branch,
        })
    }
}

/// Inputs of `sync-context`.
#[derive(Debug, Clone)]
pub struct SyncContextConfig {
    pub target: GithubTarget,
    pub ticket_key: String,
    /// Explicit branch; derived from the ticket key when unset.
    pub branch: Option<String>,
    pub agent_repo_path: PathBuf,
    pub env_file: Option<PathBuf>,
}

impl SyncContextConfig {
    pub fn from_env(env: &dyn EnvSource, settings: &Settings) -> Result<Self, ExitError> {
        let mut reader = EnvReader::new(env);
        let target = read_target(&mut reader, settings);
        let ticket_key = reader.required("JIRA_ISSUE_KEY");
        let branch = reader.optional("CONTEXT_BRANCH");
        let agent_repo_path = PathBuf::from(reader.or_default("AGENT_REPO_PATH", "."));
        let env_file = reader.optional("GITHUB_ENV").map(PathBuf::from);
        reader.finish()?;
        Ok(Self {
            target,
            ticket_key,
            branch,
            agent_repo_path,
            env_file,
        })
    }

    pub fn branch_name(&self) -> String {
        self.branch
            .clone()
            .unwrap_or_else(|| TicketRef::new(&self.ticket_key).context_branch())
    }
}
