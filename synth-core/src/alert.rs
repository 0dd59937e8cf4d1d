//! Turning a run's failures into at most one operator alert.

use crate::scenario::FailureKind;
use crate::scenario::ScenarioError;

/// How many characters of each failure's detail make it into the alert.
pub const DETAIL_PREVIEW_CHARS: usize = 100;

/// Substrings that identify an HTML error page served by a gateway instead of the provider.
///
/// Content sniffing is fragile. Provider clients already classify these responses as
/// [`FailureKind::Gateway`]; this list catches the ones that arrive as free text.
const HTML_PAGE_MARKERS: &[&str] = &["<!doctype html", "<html"];

/// Whether a failure is gateway noise that should not page anyone.
pub fn is_noise(error: &ScenarioError) -> bool {
    if error.kind == FailureKind::Gateway {
        return true;
    }

    let detail = error.detail.to_ascii_lowercase();
    HTML_PAGE_MARKERS
        .iter()
        .any(|marker| detail.contains(marker))
}

/// The failures of one run that survived noise filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationBatch {
    environment: String,
    errors: Vec<ScenarioError>,
}

impl NotificationBatch {
    /// Filter and deduplicate `errors`.
    ///
    /// Returns `None` if nothing is left to report.
    pub fn collect<I>(environment: impl Into<String>, errors: I) -> Option<Self>
    where
        I: IntoIterator<Item = ScenarioError>,
    {
        let mut kept: Vec<ScenarioError> = Vec::new();
        for error in errors {
            if is_noise(&error) {
                tracing::warn!(
                    scenario = %error.scenario,
                    operation = %error.operation,
                    "Dropping gateway error page from alert"
                );
                continue;
            }

            if !kept.contains(&error) {
                kept.push(error);
            }
        }

        if kept.is_empty() {
            return None;
        }

        Some(Self {
            environment: environment.into(),
            errors: kept,
        })
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn errors(&self) -> &[ScenarioError] {
        &self.errors
    }

    /// Render the alert text.
    pub fn message(&self) -> String {
        let mut message = format!(
            "⚠️ Alert: {} synthetic tests failed!\n\nFailed tests:",
            self.environment
        );

        for error in &self.errors {
            let detail: String = error.detail.chars().take(DETAIL_PREVIEW_CHARS).collect();
            message.push_str(&format!(
                "\n- {} ({}): {}",
                error.scenario, error.operation, detail
            ));
        }

        message
    }
}
