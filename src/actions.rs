//! Reporting to the GitHub Actions runner: step outputs and the failed-run signal.

use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::{RunError, RunOutcome};

/// Writes step outputs to the file named by `GITHUB_OUTPUT`, or as
/// `::set-output` workflow commands on runners that do not provide one.
#[derive(Debug, Clone, Default)]
pub struct ActionOutputs {
    path: Option<PathBuf>,
}

impl ActionOutputs {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn from_env() -> Self {
        let path = std::env::var_os("GITHUB_OUTPUT")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        Self::new(path)
    }

    pub fn set(&self, name: &str, value: impl Display) -> Result<()> {
        let value = value.to_string();
        let Some(path) = &self.path else {
            println!("::set-output name={}::{}", name, escape_data(&value));
            return Ok(());
        };

        let delimiter = delimiter_for(&value);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open output file {}", path.display()))?;
        writeln!(file, "{name}<<{delimiter}\n{value}\n{delimiter}")
            .with_context(|| format!("failed to write output `{name}`"))?;

        Ok(())
    }
}

/// Maps the run result onto step outputs. A rejected delivery still writes
/// `status` and `response` before the error is returned.
pub fn report(result: Result<RunOutcome, RunError>, outputs: &ActionOutputs) -> Result<()> {
    match result {
        Ok(RunOutcome::Delivered(delivery)) => {
            outputs.set("status", delivery.status)?;
            outputs.set("response", &delivery.body)?;
        }
        Ok(RunOutcome::Skipped(reason)) => {
            outputs.set("message", reason)?;
        }
        Err(RunError::Rejected(delivery)) => {
            outputs.set("status", delivery.status)?;
            outputs.set("response", &delivery.body)?;
            return Err(RunError::Rejected(delivery).into());
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Emits the `::error::` workflow command that marks the run as failed.
/// The caller is responsible for the non-zero exit code.
pub fn fail(message: &str) {
    println!("::error::{}", escape_data(message));
}

/// Escapes data for a workflow command so it stays on one line.
pub fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

// Heredoc delimiter that does not occur in the value.
fn delimiter_for(value: &str) -> String {
    let mut n = 0u32;
    loop {
        let delimiter = format!("ghadelimiter_{n}");
        if !value.contains(&delimiter) {
            return delimiter;
        }
        n += 1;
    }
}
