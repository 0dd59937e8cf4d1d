//! End-to-end flows across both providers.
//!
//! A scenario never fails past its boundary: whatever happens, [`Scenario::run`] yields exactly
//! one [`ScenarioResult`], labelled with the step it got to.

mod swap;
mod transfer;

pub use swap::LightningSwap;
pub use transfer::RoundTripTransfer;

use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use synth_core::Error;
use synth_core::FailureKind;
use synth_core::Outcome;
use synth_core::ScenarioError;
use synth_core::ScenarioResult;
use tracing::Instrument;

/// Operation labels reported when a scenario stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateInvoiceA,
    PayFromB,
    SettleWait,
    QueryBalanceA,
    CreateInvoiceB,
    PrepareAndSend,
    AwaitTerminal,
    TransferOut,
    TransferBack,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::CreateInvoiceA => "create_invoice_a",
            Step::PayFromB => "pay_from_b",
            Step::SettleWait => "settle_wait",
            Step::QueryBalanceA => "query_balance_a",
            Step::CreateInvoiceB => "create_invoice_b",
            Step::PrepareAndSend => "prepare_and_send",
            Step::AwaitTerminal => "await_terminal",
            Step::TransferOut => "transfer_out",
            Step::TransferBack => "transfer_back",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) trait StepContext<T> {
    /// Label a failure with the scenario and the step it happened at.
    fn at_step(self, scenario: &str, step: Step) -> Result<T, ScenarioError>;
}

impl<T> StepContext<T> for Result<T, Error> {
    fn at_step(self, scenario: &str, step: Step) -> Result<T, ScenarioError> {
        self.map_err(|e| ScenarioError::from_error(scenario, step.as_str(), &e))
    }
}

#[async_trait]
pub trait Scenario: Send + Sync {
    /// Stable identifier used in logs and alerts.
    fn name(&self) -> &str;

    /// One line on what the scenario checks.
    fn description(&self) -> &str;

    async fn run(&self) -> ScenarioResult;
}

/// Run every scenario once, in order or all at once.
///
/// Results come back in the order of `scenarios`. A scenario that panics is reported as a
/// failure instead of taking the run down.
pub async fn run_all(scenarios: &[Box<dyn Scenario>], concurrent: bool) -> Vec<ScenarioResult> {
    if concurrent {
        return join_all(scenarios.iter().map(|s| run_one(s.as_ref()))).await;
    }

    let mut results = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        results.push(run_one(scenario.as_ref()).await);
    }

    results
}

async fn run_one(scenario: &dyn Scenario) -> ScenarioResult {
    let span = tracing::info_span!("scenario", scenario = scenario.name());

    async {
        tracing::info!(description = scenario.description(), "Starting scenario");

        let result = match AssertUnwindSafe(scenario.run()).catch_unwind().await {
            Ok(result) => result,
            Err(_) => ScenarioResult::failed(ScenarioError::new(
                scenario.name(),
                "run",
                FailureKind::Provider,
                "scenario panicked",
            )),
        };

        match &result.outcome {
            Outcome::Success => {
                tracing::info!(operation = %result.operation, "Scenario succeeded");
            }
            Outcome::SuccessWithWarning(warning) => {
                tracing::warn!(
                    operation = %result.operation,
                    "Scenario succeeded with warning: {warning}"
                );
            }
            Outcome::Error(e) => {
                tracing::error!(
                    operation = %result.operation,
                    kind = %e.kind,
                    "Scenario failed: {}",
                    e.detail
                );
            }
        }

        result
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(ScenarioResult);

    #[async_trait]
    impl Scenario for Fixed {
        fn name(&self) -> &str {
            &self.0.scenario
        }

        fn description(&self) -> &str {
            "fixed result"
        }

        async fn run(&self) -> ScenarioResult {
            self.0.clone()
        }
    }

    struct Panics;

    #[async_trait]
    impl Scenario for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        fn description(&self) -> &str {
            "always panics"
        }

        async fn run(&self) -> ScenarioResult {
            panic!("provider returned nonsense")
        }
    }

    #[test]
    fn step_labels() {
        assert_eq!(Step::PayFromB.to_string(), "pay_from_b");
        assert_eq!(Step::AwaitTerminal.as_str(), "await_terminal");
        assert_eq!(Step::TransferBack.as_str(), "transfer_back");
    }

    #[test]
    fn errors_are_labelled_with_the_step() {
        let err = Err::<(), _>(Error::provider("spark_balance", "wallet locked"))
            .at_step("lightning-swap", Step::QueryBalanceA)
            .expect_err("labelled");

        assert_eq!(err.scenario, "lightning-swap");
        assert_eq!(err.operation, "query_balance_a");
        assert_eq!(err.kind, FailureKind::Provider);
        assert_eq!(err.detail, "spark_balance failed: wallet locked");
    }

    #[tokio::test]
    async fn results_keep_scenario_order() {
        let scenarios: Vec<Box<dyn Scenario>> = vec![
            Box::new(Fixed(ScenarioResult::success("first", "await_terminal"))),
            Box::new(Fixed(ScenarioResult::warning(
                "second",
                "query_balance_a",
                "low balance",
            ))),
        ];

        for concurrent in [false, true] {
            let results = run_all(&scenarios, concurrent).await;

            let names: Vec<_> = results.iter().map(|r| r.scenario.as_str()).collect();
            assert_eq!(names, ["first", "second"]);
        }
    }

    #[tokio::test]
    async fn panicking_scenario_becomes_a_failure() {
        let scenarios: Vec<Box<dyn Scenario>> = vec![
            Box::new(Panics),
            Box::new(Fixed(ScenarioResult::success("after", "transfer_back"))),
        ];

        let results = run_all(&scenarios, false).await;

        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].error().map(|e| e.detail.as_str()),
            Some("scenario panicked")
        );
        assert!(results[1].is_success());
    }
}
