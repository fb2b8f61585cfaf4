pub mod assign;
pub mod create_issue;
pub mod schema;
pub mod sync_context;

use std::time::Duration;

use crate::config::{GithubTarget, Settings};
use crate::github::GithubClient;

fn connect(target: &GithubTarget, settings: &Settings) -> GithubClient {
    GithubClient::new(
        &target.api_base,
        &target.token,
        Duration::from_secs(settings.timeout_secs),
    )
}
