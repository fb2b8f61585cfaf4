//! jira-relay - mirror Jira tickets into GitHub issues and route them to a
//! coding agent

pub mod ci;
pub mod commands;
pub mod config;
pub mod error;
pub mod github;
pub mod telemetry;
pub mod template;
pub mod ticket;
pub mod workflow;
