use std::process::ExitCode;

use anyhow::Result;
use change_events_action::actions::{self, ActionOutputs};
use change_events_action::{ChangeEventsClient, Config, Trigger};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing with env filter, defaulting to info levels if RUST_LOG is unset.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=info,hyper_util=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();

    let outputs = ActionOutputs::from_env();
    match execute(&outputs).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("{e:#}");
            tracing::error!(error = %message, "change event run failed");
            actions::fail(&message);
            ExitCode::FAILURE
        }
    }
}

async fn execute(outputs: &ActionOutputs) -> Result<()> {
    let config = Config::load()?;
    let trigger = Trigger::from_path(&config.github.event_name, &config.github.event_path)?;
    tracing::info!(
        event_name = %trigger.event_name,
        action = trigger.action().unwrap_or_default(),
        "handling event"
    );
    tracing::debug!(document = %trigger.document, "event payload");

    let client = ChangeEventsClient::new(config.change_events_url.clone())?;

    let result = change_events_action::run(&config, &trigger, &client).await;
    actions::report(result, outputs)
}
