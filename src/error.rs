use std::process::ExitCode;

/// Errors that cause jira-relay to exit with a specific code.
#[derive(Debug, thiserror::Error)]
pub enum ExitError {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to create issue for {ticket}: {message}")]
    IssueCreation { ticket: String, message: String },

    #[error("context sync failed: {0}")]
    ContextSync(String),

    #[error("issue #{issue} was neither assigned nor commented on")]
    Unnotified { issue: u64 },
}

impl ExitError {
    /// Build a config error listing every missing environment variable.
    pub fn missing_vars(names: &[&str]) -> Self {
        ExitError::Config(format!(
            "missing required environment variables: {}",
            names.join(", ")
        ))
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    /// Raw numeric exit code, also used by the CLI tests.
    pub const fn code(&self) -> u8 {
        match self {
            ExitError::Config(_) => 2,
            ExitError::IssueCreation { .. } => 3,
            ExitError::ContextSync(_) => 4,
            ExitError::Unnotified { .. } => 5,
        }
    }
}
