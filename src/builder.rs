use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::models::change_event::{
    ChangeEvent, ChangePayload, CustomDetails, EVENT_SOURCE, Link, PullRequestDetails,
};
use crate::models::github::{MalformedEventError, PullRequestEvent, PushEvent};

/// Maximum summary length, in characters.
pub const SUMMARY_MAX_CHARS: usize = 1024;

/// Maximum serialized change event size, in bytes.
pub const MAX_EVENT_BYTES: usize = 524_288;

#[derive(Debug, Error)]
pub enum SizeLimitError {
    #[error("failed to serialize change event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(
        "change event is {size} bytes, over the {limit} byte limit, and its body cannot absorb the excess"
    )]
    TooLarge { size: usize, limit: usize },
}

pub fn build_push_event(
    routing_key: &SecretString,
    push: &PushEvent,
    now: DateTime<Utc>,
) -> ChangeEvent {
    let summary = format!(
        "{} pushed branch {} from {}",
        push.sender.login,
        push.branch(),
        push.repository.full_name
    );

    ChangeEvent {
        routing_key: copy_key(routing_key),
        payload: ChangePayload {
            summary: truncate_chars(&summary, SUMMARY_MAX_CHARS),
            source: EVENT_SOURCE.to_string(),
            timestamp: push.repository.updated_at.unwrap_or(now),
            custom_details: CustomDetails::Empty,
        },
        links: vec![
            Link::new(&push.compare, "View on GitHub"),
            Link::new(&push.repository.html_url, "Repo"),
            Link::new(
                &push.sender.html_url,
                format!("Sender - {}", push.sender.login),
            ),
        ],
    }
}

/// Builds the change event for a merged pull request. Returns `None` when the
/// pull request was not merged.
pub fn build_pull_request_event(
    routing_key: &SecretString,
    event: &PullRequestEvent,
) -> Result<Option<ChangeEvent>, MalformedEventError> {
    let Some(merge) = event.merge()? else {
        tracing::info!(
            action = %event.action,
            "pull request is not merged, nothing to build"
        );
        return Ok(None);
    };

    let pr = &event.pull_request;
    let summary = format!("[PR Merged - {}] {}", event.repository.full_name, pr.title);

    Ok(Some(ChangeEvent {
        routing_key: copy_key(routing_key),
        payload: ChangePayload {
            summary: truncate_chars(&summary, SUMMARY_MAX_CHARS),
            source: EVENT_SOURCE.to_string(),
            timestamp: merge.merged_at,
            custom_details: CustomDetails::PullRequest(PullRequestDetails {
                body: pr.body.clone(),
                repo: event.repository.full_name.clone(),
                commits: pr.commits,
                review_comments: pr.review_comments,
                additions: pr.additions,
                deletions: pr.deletions,
                changed_files: pr.changed_files,
            }),
        },
        links: vec![
            Link::new(&pr.html_url, "View on GitHub"),
            Link::new(
                &merge.merged_by.html_url,
                format!("Merged by - {}", merge.merged_by.login),
            ),
            Link::new(&pr.user.html_url, format!("Opened by - {}", pr.user.login)),
        ],
    }))
}

pub fn build_custom_event(
    routing_key: &SecretString,
    summary: &str,
    run_url: &str,
    now: DateTime<Utc>,
) -> ChangeEvent {
    ChangeEvent {
        routing_key: copy_key(routing_key),
        payload: ChangePayload {
            summary: truncate_chars(summary, SUMMARY_MAX_CHARS),
            source: EVENT_SOURCE.to_string(),
            timestamp: now,
            custom_details: CustomDetails::Empty,
        },
        links: vec![Link::new(run_url, "View run")],
    }
}

/// Shrinks `custom_details.body` so the serialized event fits in
/// [`MAX_EVENT_BYTES`]. No other field is touched.
pub fn enforce_size_limit(mut event: ChangeEvent) -> Result<ChangeEvent, SizeLimitError> {
    let size = event.to_json()?.len();
    if size <= MAX_EVENT_BYTES {
        return Ok(event);
    }

    let too_large = SizeLimitError::TooLarge {
        size,
        limit: MAX_EVENT_BYTES,
    };
    let CustomDetails::PullRequest(details) = &mut event.payload.custom_details else {
        return Err(too_large);
    };
    let Some(body) = details.body.as_mut() else {
        return Err(too_large);
    };
    let cut = truncation_point(body, size - MAX_EVENT_BYTES).ok_or(too_large)?;

    tracing::warn!(
        size,
        limit = MAX_EVENT_BYTES,
        removed = body.len() - cut,
        "change event over size limit, truncating pull request body"
    );
    body.truncate(cut);

    Ok(event)
}

/// Byte offset at which `body` must be cut for its JSON encoding to shrink by
/// at least `excess` bytes, or `None` if the whole body is not enough.
fn truncation_point(body: &str, excess: usize) -> Option<usize> {
    let mut removed = 0;
    for (idx, ch) in body.char_indices().rev() {
        removed += json_encoded_len(ch);
        if removed >= excess {
            return Some(idx);
        }
    }
    None
}

// Bytes serde_json emits for `ch` inside a string literal.
fn json_encoded_len(ch: char) -> usize {
    match ch {
        '"' | '\\' | '\n' | '\r' | '\t' | '\u{08}' | '\u{0C}' => 2,
        c if (c as u32) < 0x20 => 6,
        c => c.len_utf8(),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn copy_key(routing_key: &SecretString) -> SecretString {
    SecretString::from(routing_key.expose_secret().to_string())
}
