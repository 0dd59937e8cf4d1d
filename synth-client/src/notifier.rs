//! Delivering the alert for a run.

use async_trait::async_trait;
use serde::Serialize;
use synth_core::Error;
use synth_core::ErrorContext as _;
use synth_core::NotificationBatch;
use synth_core::ScenarioError;

const SEND_ALERT: &str = "send_alert";

/// A channel that accepts one text message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), Error>;
}

/// Incoming webhook accepting `{"text": ...}`.
#[derive(Debug, Clone)]
pub struct SlackWebhook {
    client: reqwest::Client,
    url: String,
}

impl SlackWebhook {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    fn request(&self, text: &str) -> reqwest::RequestBuilder {
        self.client.post(&self.url).json(&WebhookMessage { text })
    }
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
}

#[async_trait]
impl Notifier for SlackWebhook {
    async fn send(&self, text: &str) -> Result<(), Error> {
        let response = self.request(text).send().await.operation(SEND_ALERT)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(
                SEND_ALERT,
                format!("HTTP {}: {body}", status.as_u16()),
            ));
        }

        Ok(())
    }
}

/// Writes the alert to the log instead of posting it anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<(), Error> {
        tracing::warn!("Alert (dry run):\n{text}");

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Every failure was filtered out, or there were none.
    NothingToReport,
    Sent,
    /// No notification channel is configured.
    NotConfigured,
    Failed(Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyReport {
    pub batch: Option<NotificationBatch>,
    pub delivery: Delivery,
}

impl NotifyReport {
    /// Non-zero whenever a failure survived filtering, whether or not the alert went out.
    pub fn exit_code(&self) -> i32 {
        match self.batch {
            Some(_) => 1,
            None => 0,
        }
    }
}

/// Filter `errors` and send at most one alert for what is left.
pub async fn notify(
    notifier: Option<&dyn Notifier>,
    environment: &str,
    errors: Vec<ScenarioError>,
) -> NotifyReport {
    let total = errors.len();

    let Some(batch) = NotificationBatch::collect(environment, errors) else {
        if total > 0 {
            tracing::info!(total, "All failures were gateway noise, not alerting");
        }

        return NotifyReport {
            batch: None,
            delivery: Delivery::NothingToReport,
        };
    };

    let message = batch.message();
    tracing::error!(
        environment = batch.environment(),
        failures = batch.errors().len(),
        "{message}"
    );

    let delivery = match notifier {
        None => {
            tracing::error!("No alert webhook configured, no notification sent");
            Delivery::NotConfigured
        }
        Some(notifier) => match notifier.send(&message).await {
            Ok(()) => {
                tracing::info!("Alert sent");
                Delivery::Sent
            }
            Err(e) => {
                tracing::error!("Failed to send alert: {e}");
                Delivery::Failed(e)
            }
        },
    };

    NotifyReport {
        batch: Some(batch),
        delivery,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_posts_the_text_as_json() {
        let webhook = SlackWebhook::new(reqwest::Client::new(), "https://hooks.example/T01/B02");

        let request = webhook.request("Alert: mainnet").build().expect("request");

        assert_eq!(request.method(), &reqwest::Method::POST);
        assert_eq!(request.url().as_str(), "https://hooks.example/T01/B02");
        assert_eq!(
            request
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        assert_eq!(
            request.body().and_then(|body| body.as_bytes()),
            Some(br#"{"text":"Alert: mainnet"}"#.as_slice())
        );
    }
}
