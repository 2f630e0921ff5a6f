use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use url::Url;

use crate::models::change_event::ChangeEvent;

pub const DEFAULT_CHANGE_EVENTS_URL: &str = "https://events.pagerduty.com/v2/change/enqueue";

/// Response of the ingestion endpoint to a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub status: u16,
    pub body: String,
}

impl Delivery {
    pub fn is_accepted(&self) -> bool {
        self.status == StatusCode::ACCEPTED.as_u16()
    }
}

/// Minimal client for the change events ingestion endpoint. The routing key
/// inside the event authenticates the request, so no auth header is sent.
#[derive(Clone, Debug)]
pub struct ChangeEventsClient {
    endpoint: Url,
    http: reqwest::Client,
}

impl ChangeEventsClient {
    pub fn new(endpoint: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build http client")?;
        Ok(Self::with_http(endpoint, http))
    }

    pub fn with_http(endpoint: Url, http: reqwest::Client) -> Self {
        Self { endpoint, http }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST the event once. Any status is returned as a [`Delivery`]; only
    /// transport failures are errors.
    pub async fn send(&self, event: &ChangeEvent) -> Result<Delivery, reqwest::Error> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(event)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        tracing::debug!(status, "change event delivery settled");

        Ok(Delivery { status, body })
    }
}
