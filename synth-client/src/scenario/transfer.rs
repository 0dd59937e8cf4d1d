use crate::provider::Transfers;
use crate::scenario::Scenario;
use crate::scenario::Step;
use crate::scenario::StepContext as _;
use crate::spark::SparkAccount;
use async_trait::async_trait;
use std::time::Duration;
use synth_core::Amount;
use synth_core::Direction;
use synth_core::PaymentIntent;
use synth_core::ScenarioError;
use synth_core::ScenarioResult;

const NAME: &str = "spark-transfer";

/// Move `amount` from `a` to `b` and back again.
pub struct RoundTripTransfer<T> {
    transfers: T,
    a: SparkAccount,
    b: SparkAccount,
    amount: Amount,
    delay: Duration,
}

impl<T> RoundTripTransfer<T>
where
    T: Transfers + Send + Sync,
{
    pub fn new(transfers: T, a: SparkAccount, b: SparkAccount, amount: Amount) -> Self {
        Self {
            transfers,
            a,
            b,
            amount,
            delay: Duration::from_secs(5),
        }
    }

    /// Pause after each leg so the receiving wallet sees the funds before they move again.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn transfers(&self) -> &T {
        &self.transfers
    }

    async fn execute(&self) -> Result<ScenarioResult, ScenarioError> {
        let out =
            PaymentIntent::new(self.amount, Direction::AToB).at_step(NAME, Step::TransferOut)?;

        tracing::info!(
            step = %Step::TransferOut,
            amount = self.amount.to_sat(),
            "Transferring A->B"
        );

        self.transfers
            .transfer(&self.a.credential, &self.b.address, &out)
            .await
            .at_step(NAME, Step::TransferOut)?;

        tokio::time::sleep(self.delay).await;

        // Fresh intent: the idempotency key must differ from the first leg's.
        let back =
            PaymentIntent::new(self.amount, Direction::BToA).at_step(NAME, Step::TransferBack)?;

        tracing::info!(
            step = %Step::TransferBack,
            amount = self.amount.to_sat(),
            "Transferring B->A"
        );

        self.transfers
            .transfer(&self.b.credential, &self.a.address, &back)
            .await
            .at_step(NAME, Step::TransferBack)?;

        tokio::time::sleep(self.delay).await;

        Ok(ScenarioResult::success(NAME, Step::TransferBack.as_str()))
    }
}

#[async_trait]
impl<T> Scenario for RoundTripTransfer<T>
where
    T: Transfers + Send + Sync,
{
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Spark transfers between Spark wallets"
    }

    async fn run(&self) -> ScenarioResult {
        self.execute().await.unwrap_or_else(ScenarioResult::failed)
    }
}
