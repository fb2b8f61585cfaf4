//! The Jira ticket being relayed.

use serde::Serialize;

pub const DEFAULT_PRIORITY: &str = "Medium";
pub const DEFAULT_ISSUE_TYPE: &str = "Task";

/// Jira ticket fields as handed over by the CI trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketRef {
    pub key: String,
    pub summary: String,
    pub description: String,
    pub priority: String,
    pub issue_type: String,
    pub url: String,
}

impl TicketRef {
    /// Ticket with only a key; other fields take their defaults.
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            summary: String::new(),
            description: String::new(),
            priority: DEFAULT_PRIORITY.to_string(),
            issue_type: DEFAULT_ISSUE_TYPE.to_string(),
            url: String::new(),
        }
    }

    /// Issue title, `[KEY] summary`.
    pub fn title(&self) -> String {
        let summary = self.summary.trim();
        if summary.is_empty() {
            format!("[{}]", self.key)
        } else {
            format!("[{}] {summary}", self.key)
        }
    }

    /// `priority-high`, `priority-very-low`, ...
    pub fn priority_label(&self) -> String {
        let slug = self
            .priority
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        format!("priority-{slug}")
    }

    /// Branch the context docs are published to.
    pub fn context_branch(&self) -> String {
        format!("jira/{}", self.key.to_lowercase())
    }
}
