use chrono::{DateTime, SecondsFormat, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer, ser::SerializeMap};

/// Origin system reported in every change event.
pub const EVENT_SOURCE: &str = "GitHub";

/// Change event accepted by the change-tracking ingestion endpoint.
#[derive(Debug, Serialize)]
pub struct ChangeEvent {
    #[serde(serialize_with = "expose_routing_key")]
    pub routing_key: SecretString,
    pub payload: ChangePayload,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangePayload {
    pub summary: String,
    pub source: String,
    #[serde(serialize_with = "iso_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub custom_details: CustomDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    pub text: String,
}

impl Link {
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
        }
    }
}

/// Variant-specific extra fields. Serializes as `{}` when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CustomDetails {
    #[default]
    Empty,
    PullRequest(PullRequestDetails),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestDetails {
    pub body: Option<String>,
    pub repo: String,
    pub commits: u64,
    pub review_comments: u64,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
}

impl Serialize for CustomDetails {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CustomDetails::Empty => serializer.serialize_map(Some(0))?.end(),
            CustomDetails::PullRequest(details) => details.serialize(serializer),
        }
    }
}

impl ChangeEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn expose_routing_key<S: Serializer>(key: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(key.expose_secret())
}

fn iso_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
