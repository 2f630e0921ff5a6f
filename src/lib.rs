pub mod actions;
pub mod branch_filter;
pub mod builder;
pub mod change_events_client;
pub mod config;
pub mod models;
pub mod router;

#[cfg(test)]
mod fixtures;

pub use change_events_client::*;
pub use config::Config;
pub use router::{Route, Trigger};

use chrono::Utc;
use thiserror::Error;

use builder::SizeLimitError;
use models::change_event::ChangeEvent;
use models::github::{MalformedEventError, PullRequestEvent, PushEvent};

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The ingestion endpoint accepted the change event.
    Delivered(Delivery),
    /// Nothing was sent; the reason is reported to the runner.
    Skipped(String),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    MalformedEvent(#[from] MalformedEventError),

    #[error(transparent)]
    PayloadTooLarge(#[from] SizeLimitError),

    /// The endpoint answered with something other than 202.
    #[error("unexpected status code {}", .0.status)]
    Rejected(Delivery),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Routes the trigger, builds at most one change event and delivers it.
pub async fn run(
    config: &Config,
    trigger: &Trigger,
    client: &ChangeEventsClient,
) -> Result<RunOutcome, RunError> {
    let routing_key = &config.inputs.integration_key;
    let branch_filter = config.inputs.branch_filter();
    let now = Utc::now();

    let event = match router::classify(trigger, config.inputs.custom_event()) {
        Route::Custom(summary) => {
            builder::build_custom_event(routing_key, &summary, &config.github.run_url(), now)
        }
        Route::Push => {
            let push = PushEvent::from_document(&trigger.document)?;
            if !branch_filter.is_allowed(push.branch()) {
                return Ok(skip_branch(push.branch()));
            }
            builder::build_push_event(routing_key, &push, now)
        }
        Route::PullRequestMerged => {
            let pr = PullRequestEvent::from_document(&trigger.document)?;
            if !branch_filter.is_allowed(pr.base_branch()) {
                return Ok(skip_branch(pr.base_branch()));
            }
            match builder::build_pull_request_event(routing_key, &pr)? {
                Some(event) => event,
                None => return Ok(RunOutcome::Skipped("pull request was not merged".into())),
            }
        }
        Route::Unhandled(reason) => {
            tracing::info!(event_name = %trigger.event_name, %reason, "no action taken");
            return Ok(RunOutcome::Skipped(reason));
        }
    };

    deliver(client, event).await
}

async fn deliver(client: &ChangeEventsClient, event: ChangeEvent) -> Result<RunOutcome, RunError> {
    let event = builder::enforce_size_limit(event)?;

    tracing::info!(
        endpoint = %client.endpoint(),
        summary = %event.payload.summary,
        "sending change event"
    );
    let delivery = client.send(&event).await?;

    if delivery.is_accepted() {
        tracing::info!(status = delivery.status, "change event accepted");
        Ok(RunOutcome::Delivered(delivery))
    } else {
        tracing::warn!(
            status = delivery.status,
            body = %delivery.body,
            "change event rejected"
        );
        Err(RunError::Rejected(delivery))
    }
}

fn skip_branch(branch: &str) -> RunOutcome {
    tracing::info!(branch, "branch is not in the allow-list, skipping");
    RunOutcome::Skipped(format!("branch `{branch}` is not in the allow-list"))
}
