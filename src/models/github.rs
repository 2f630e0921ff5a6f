use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// Raised when an inbound webhook document does not have the shape its event kind requires.
#[derive(Debug, Error)]
pub enum MalformedEventError {
    #[error("malformed {kind} event: {source}")]
    Shape {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed {kind} event: merged pull request is missing `{field}`")]
    MissingMergeField {
        kind: &'static str,
        field: &'static str,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubUser {
    pub login: String,
    pub html_url: String,
}

// GitHub `push` webhook payload (minimal)
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub compare: String,
    pub repository: PushRepository,
    pub sender: GithubUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushRepository {
    pub full_name: String,
    pub html_url: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

// An unparseable timestamp is treated as absent rather than failing the event.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc)))
}

impl PushEvent {
    pub fn from_document(document: &Value) -> Result<Self, MalformedEventError> {
        Self::deserialize(document).map_err(|source| MalformedEventError::Shape {
            kind: "push",
            source,
        })
    }

    /// Branch name: the last `/` segment of the pushed ref.
    pub fn branch(&self) -> &str {
        self.git_ref.rsplit('/').next().unwrap_or(&self.git_ref)
    }
}

// GitHub `pull_request` webhook payload (minimal)
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequest,
    pub repository: PullRequestRepository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestRepository {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub commits: u64,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
    pub review_comments: u64,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    pub html_url: String,
    pub user: GithubUser,
    #[serde(default)]
    pub merged_by: Option<GithubUser>,
    pub base: BaseRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaseRef {
    #[serde(rename = "ref")]
    pub branch: String,
}

/// Merge-only fields of a pull request, present once `merged` is true.
#[derive(Debug, Clone, Copy)]
pub struct Merge<'a> {
    pub merged_at: DateTime<Utc>,
    pub merged_by: &'a GithubUser,
}

impl PullRequestEvent {
    pub fn from_document(document: &Value) -> Result<Self, MalformedEventError> {
        Self::deserialize(document).map_err(|source| MalformedEventError::Shape {
            kind: "pull_request",
            source,
        })
    }

    /// Target branch of the pull request.
    pub fn base_branch(&self) -> &str {
        &self.pull_request.base.branch
    }

    /// Returns the merge details, or `None` when the pull request was not merged.
    /// A merged pull request lacking `merged_at` or `merged_by` is malformed.
    pub fn merge(&self) -> Result<Option<Merge<'_>>, MalformedEventError> {
        let pr = &self.pull_request;
        if !pr.merged {
            return Ok(None);
        }

        let Some(merged_at) = pr.merged_at else {
            return Err(MalformedEventError::MissingMergeField {
                kind: "pull_request",
                field: "merged_at",
            });
        };
        let Some(merged_by) = pr.merged_by.as_ref() else {
            return Err(MalformedEventError::MissingMergeField {
                kind: "pull_request",
                field: "merged_by",
            });
        };

        Ok(Some(Merge {
            merged_at,
            merged_by,
        }))
    }
}
