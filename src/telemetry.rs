//! Diagnostic logging.
//!
//! Events go to stderr so stdout stays reserved for progress lines and CI
//! annotations. `JIRA_RELAY_LOG` takes an `EnvFilter` directive (default
//! `warn`); `JIRA_RELAY_LOG_FORMAT=json` switches to one JSON object per line.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_ENV: &str = "JIRA_RELAY_LOG";
pub const FORMAT_ENV: &str = "JIRA_RELAY_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

fn filter_from(raw: Option<&str>) -> EnvFilter {
    raw.and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init() {
    let filter = filter_from(std::env::var(LOG_ENV).ok().as_deref());
    let format = LogFormat::parse(std::env::var(FORMAT_ENV).ok().as_deref());

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };
    if let Err(err) = result {
        eprintln!("warning: logging not initialised: {err}");
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::filter::LevelFilter;

    use super::*;

    #[test]
    fn format_defaults_to_text() {
        assert_eq!(LogFormat::parse(None), LogFormat::Text);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Text);
        assert_eq!(LogFormat::parse(Some(" JSON ")), LogFormat::Json);
    }

    #[test]
    fn bad_directive_falls_back_to_warn() {
        let warn = Some(LevelFilter::WARN);
        assert_eq!(filter_from(Some("relay=notalevel")).max_level_hint(), warn);
        assert_eq!(filter_from(None).max_level_hint(), warn);
        assert_eq!(
            filter_from(Some("debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }
}
