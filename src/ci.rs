//! GitHub Actions plumbing: workflow-command annotations on stdout and
//! `NAME=value` exports appended to the `$GITHUB_ENV` file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;

#[derive(Debug, Clone, Default)]
pub struct CiReporter {
    env_file: Option<PathBuf>,
}

impl CiReporter {
    pub const fn new(env_file: Option<PathBuf>) -> Self {
        Self { env_file }
    }

    pub fn notice(&self, title: &str, message: &str) {
        println!("{}", annotation("notice", title, message));
    }

    pub fn warning(&self, title: &str, message: &str) {
        println!("{}", annotation("warning", title, message));
    }

    /// Expose `name=value` to later steps of the job. Skipped when no env file
    /// is configured, which is the case outside Actions.
    pub fn export(&self, name: &str, value: &str) -> anyhow::Result<()> {
        let Some(path) = &self.env_file else {
            tracing::debug!(name, "GITHUB_ENV unset, export skipped");
            return Ok(());
        };
        append_env(path, name, value)
    }
}

fn append_env(path: &Path, name: &str, value: &str) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    writeln!(file, "{name}={value}").with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn annotation(kind: &str, title: &str, message: &str) -> String {
    format!(
        "::{kind} title={}::{}",
        escape_property(title),
        escape_data(message)
    )
}

fn escape_data(raw: &str) -> String {
    raw.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(raw: &str) -> String {
    escape_data(raw).replace(':', "%3A").replace(',', "%2C")
}
