use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use config::{Config as ConfigBuilder, Environment};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::branch_filter::BranchFilter;
use crate::change_events_client::DEFAULT_CHANGE_EVENTS_URL;

#[derive(Debug)]
pub struct Config {
    pub inputs: ActionInputs,
    pub github: GithubContext,
    pub change_events_url: Url,
}

/// Action inputs, read from the runner's `INPUT_*` variables.
#[derive(Debug, Deserialize)]
pub struct ActionInputs {
    #[serde(rename = "integration-key")]
    pub integration_key: SecretString,
    #[serde(default, rename = "custom-event")]
    pub custom_event: Option<String>,
    // Space-delimited branch allow-list
    #[serde(default)]
    pub branches: Option<String>,
}

/// Runner context, read from the `GITHUB_*` variables.
#[derive(Debug, Deserialize, Clone)]
pub struct GithubContext {
    pub event_name: String,
    pub event_path: PathBuf,
    pub repository: String,
    pub run_id: String,
    #[serde(default = "default_server_url")]
    pub server_url: String,
}

fn default_server_url() -> String {
    "https://github.com".to_string()
}

impl ActionInputs {
    /// The configured custom summary, if any. The runner passes unset inputs as "".
    pub fn custom_event(&self) -> Option<&str> {
        self.custom_event
            .as_deref()
            .filter(|summary| !summary.trim().is_empty())
    }

    pub fn branch_filter(&self) -> BranchFilter {
        BranchFilter::from_input(self.branches.as_deref().unwrap_or_default())
    }
}

impl GithubContext {
    /// Web URL of the workflow run executing this action.
    pub fn run_url(&self) -> String {
        format!(
            "{}/{}/actions/runs/{}",
            self.server_url.trim_end_matches('/'),
            self.repository,
            self.run_id
        )
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        #[cfg(debug_assertions)]
        load_env_file(std::path::Path::new(".env.local"))?;

        let inputs: ActionInputs = ConfigBuilder::builder()
            .add_source(Environment::with_prefix("INPUT"))
            .build()
            .context("Failed to build action inputs")?
            .try_deserialize()
            .context("Failed to deserialize action inputs")?;

        if inputs.integration_key.expose_secret().trim().is_empty() {
            bail!("input `integration-key` is required");
        }

        let github: GithubContext = ConfigBuilder::builder()
            .add_source(Environment::with_prefix("GITHUB"))
            .build()
            .context("Failed to build runner context")?
            .try_deserialize()
            .context("Failed to deserialize runner context")?;

        let change_events_url = match std::env::var("CHANGE_EVENTS_URL") {
            Ok(raw) if !raw.trim().is_empty() => raw,
            _ => DEFAULT_CHANGE_EVENTS_URL.to_string(),
        };
        let change_events_url = Url::parse(&change_events_url)
            .with_context(|| format!("invalid change events url {change_events_url:?}"))?;

        Ok(Self {
            inputs,
            github,
            change_events_url,
        })
    }
}

/// Loads a dotenv file into the environment. A missing file is not an error.
#[cfg(debug_assertions)]
fn load_env_file(path: &std::path::Path) -> Result<()> {
    if let Err(e) = dotenvy::from_path(path)
        && !e.not_found()
    {
        return Err(e).context("Failed to load dotenv file");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn run_url_joins_server_repository_and_run() {
        let mut github = fixtures::config("http://localhost/").github;
        assert_eq!(
            github.run_url(),
            "https://github.com/org/repo/actions/runs/987654321"
        );

        github.server_url = "https://ghe.example.com/".into();
        assert_eq!(
            github.run_url(),
            "https://ghe.example.com/org/repo/actions/runs/987654321"
        );
    }

    #[test]
    fn blank_custom_event_is_absent() {
        let mut inputs = fixtures::config("http://localhost/").inputs;
        assert_eq!(inputs.custom_event(), None);

        inputs.custom_event = Some("".into());
        assert_eq!(inputs.custom_event(), None);

        inputs.custom_event = Some("   ".into());
        assert_eq!(inputs.custom_event(), None);

        inputs.custom_event = Some("Deployed v1.2.3".into());
        assert_eq!(inputs.custom_event(), Some("Deployed v1.2.3"));
    }

    #[test]
    fn inputs_deserialize_runner_keys() {
        let inputs: ActionInputs = serde_json::from_value(serde_json::json!({
            "integration-key": "abc",
            "custom-event": "",
            "branches": "main release"
        }))
        .unwrap();

        assert_eq!(inputs.integration_key.expose_secret(), "abc");
        assert_eq!(inputs.custom_event(), None);
        assert!(inputs.branch_filter().is_allowed("release"));
        assert!(!inputs.branch_filter().is_allowed("dev"));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_file(&dir.path().join(".env.local")).is_ok());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn malformed_env_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.local");
        std::fs::write(&path, "not valid\n").unwrap();

        let err = load_env_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to load"));
    }
}
