use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// The triggering event: its kind and the webhook document.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub event_name: String,
    pub document: Value,
}

impl Trigger {
    pub fn new(event_name: impl Into<String>, document: Value) -> Self {
        Self {
            event_name: event_name.into(),
            document,
        }
    }

    /// Reads the webhook document the runner wrote to `path`.
    pub fn from_path(event_name: impl Into<String>, path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read event document {}", path.display()))?;
        let document = serde_json::from_str(&raw)
            .with_context(|| format!("event document {} is not valid JSON", path.display()))?;
        Ok(Self::new(event_name, document))
    }

    /// Sub-action of the event (`closed`, `opened`, ...), when the document carries one.
    pub fn action(&self) -> Option<&str> {
        self.document.get("action").and_then(Value::as_str)
    }
}

/// The single handling path chosen for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Custom(String),
    Push,
    PullRequestMerged,
    Unhandled(String),
}

/// Chooses exactly one route. A configured custom summary takes priority over
/// the event kind.
pub fn classify(trigger: &Trigger, custom_event: Option<&str>) -> Route {
    if let Some(summary) = custom_event
        && !summary.trim().is_empty()
    {
        return Route::Custom(summary.to_string());
    }

    match trigger.event_name.as_str() {
        "push" => Route::Push,
        "pull_request" => {
            let merged = trigger
                .document
                .pointer("/pull_request/merged")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            match trigger.action() {
                Some("closed") if merged => Route::PullRequestMerged,
                Some("closed") => {
                    Route::Unhandled("pull request was closed without being merged".to_string())
                }
                Some(action) => {
                    Route::Unhandled(format!("pull request action `{action}` is not a merge"))
                }
                None => Route::Unhandled("pull request event has no action".to_string()),
            }
        }
        other => Route::Unhandled(format!("no action taken for `{other}` event")),
    }
}
