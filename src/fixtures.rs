//! Webhook documents and configuration shared by unit tests.

use std::path::PathBuf;

use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

use crate::config::{ActionInputs, Config, GithubContext};

pub const ROUTING_KEY: &str = "R0UT1NGKEY";

pub fn push_document(git_ref: &str) -> Value {
    json!({
        "ref": git_ref,
        "compare": "https://github.com/org/repo/compare/abc123...def456",
        "repository": {
            "full_name": "org/repo",
            "html_url": "https://github.com/org/repo",
            "updated_at": "2024-02-28T09:15:00Z"
        },
        "sender": {
            "login": "alice",
            "html_url": "https://github.com/alice"
        }
    })
}

pub fn merged_pr_document() -> Value {
    json!({
        "action": "closed",
        "pull_request": {
            "title": "Add retry budget",
            "body": "Caps retries per request.",
            "commits": 3,
            "additions": 120,
            "deletions": 14,
            "changed_files": 5,
            "review_comments": 2,
            "merged": true,
            "merged_at": "2024-03-01T12:30:00Z",
            "html_url": "https://github.com/org/repo/pull/42",
            "user": { "login": "carol", "html_url": "https://github.com/carol" },
            "merged_by": { "login": "bob", "html_url": "https://github.com/bob" },
            "base": { "ref": "main" }
        },
        "repository": { "full_name": "org/repo" }
    })
}

pub fn unmerged_pr_document() -> Value {
    let mut doc = merged_pr_document();
    doc["pull_request"]["merged"] = json!(false);
    doc["pull_request"]["merged_at"] = Value::Null;
    doc["pull_request"]["merged_by"] = Value::Null;
    doc
}

pub fn config(endpoint: &str) -> Config {
    Config {
        inputs: ActionInputs {
            integration_key: SecretString::from(ROUTING_KEY.to_string()),
            custom_event: None,
            branches: None,
        },
        github: GithubContext {
            event_name: "push".into(),
            event_path: PathBuf::from("/github/workflow/event.json"),
            repository: "org/repo".into(),
            run_id: "987654321".into(),
            server_url: "https://github.com".into(),
        },
        change_events_url: Url::parse(endpoint).expect("valid test endpoint"),
    }
}
