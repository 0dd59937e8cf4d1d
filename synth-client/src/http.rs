use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use synth_core::Error;
use synth_core::ErrorContext as _;

/// Gateway pages are cut to this many characters before they end up in an error.
const PAGE_EXCERPT_CHARS: usize = 200;

/// Build the HTTP client shared by all providers.
///
/// Every request made with it is bounded by `timeout`, so a hung provider cannot stall a run.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))
}

/// Status and body of a provider response, read in full.
#[derive(Debug, Clone)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub async fn execute(
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Self, Error> {
        let response = request.send().await.operation(operation)?;
        let status = response.status();
        let body = response.text().await.operation(operation)?;

        tracing::debug!(operation, %status, body = %excerpt(&body), "Provider response");

        Ok(Self { status, body })
    }

    pub fn is_gateway_page(&self) -> bool {
        is_html_page(&self.body)
    }

    /// Reject gateway error pages and non-success statuses.
    pub fn ensure_success(&self, operation: &'static str) -> Result<(), Error> {
        if self.is_gateway_page() {
            return Err(Error::gateway(
                operation,
                self.status.as_u16(),
                excerpt(&self.body),
            ));
        }

        if !self.status.is_success() {
            return Err(Error::provider(
                operation,
                format!("HTTP {}: {}", self.status.as_u16(), self.body),
            ));
        }

        Ok(())
    }

    /// Decode a JSON body, treating an `error` field as a failure even on HTTP 200.
    pub fn decode<T>(&self, operation: &'static str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        self.ensure_success(operation)?;

        let value: Value = serde_json::from_str(&self.body)
            .map_err(|e| Error::provider(operation, format!("invalid JSON response: {e}")))?;

        if let Some(error) = embedded_error(&value) {
            return Err(Error::provider(operation, error));
        }

        serde_json::from_value(value)
            .map_err(|e| Error::provider(operation, format!("unexpected response shape: {e}")))
    }
}

fn embedded_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

fn is_html_page(body: &str) -> bool {
    let start = body.trim_start();
    let head = start.chars().take(15).collect::<String>().to_ascii_lowercase();

    head.starts_with("<!doctype html") || head.starts_with("<html")
}

fn excerpt(body: &str) -> String {
    body.chars().take(PAGE_EXCERPT_CHARS).collect()
}
