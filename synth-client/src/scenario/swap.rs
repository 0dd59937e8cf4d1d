use crate::poller::SettlementPoller;
use crate::provider::Lightning;
use crate::provider::Wallet;
use crate::scenario::Scenario;
use crate::scenario::Step;
use crate::scenario::StepContext as _;
use async_trait::async_trait;
use std::time::Duration;
use synth_core::Direction;
use synth_core::Error;
use synth_core::FailureKind;
use synth_core::PaymentIntent;
use synth_core::PaymentStatus;
use synth_core::ScenarioError;
use synth_core::ScenarioResult;
use synth_core::SwapPlan;

const NAME: &str = "lightning-swap";

/// Pay `plan.amount` from the counterparty into the wallet under test, then send the balance
/// minus a buffer back and wait for it to settle.
pub struct LightningSwap<A, B> {
    wallet: A,
    counterparty: B,
    plan: SwapPlan,
    poller: SettlementPoller,
    settle_delay: Duration,
    invoice_expiry: Duration,
    require_preimage: bool,
}

impl<A, B> LightningSwap<A, B>
where
    A: Wallet + Send + Sync,
    B: Lightning + Send + Sync,
{
    pub fn new(wallet: A, counterparty: B, plan: SwapPlan, poller: SettlementPoller) -> Self {
        Self {
            wallet,
            counterparty,
            plan,
            poller,
            settle_delay: Duration::from_secs(5),
            invoice_expiry: Duration::from_secs(86_400),
            require_preimage: false,
        }
    }

    /// How long to wait after the counterparty's payment before reading the balance.
    ///
    /// The counterparty exposes no payment id for its leg, so there is nothing to poll.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_invoice_expiry(mut self, invoice_expiry: Duration) -> Self {
        self.invoice_expiry = invoice_expiry;
        self
    }

    /// Fail a completed return leg that comes back without a preimage.
    pub fn require_preimage(mut self, require_preimage: bool) -> Self {
        self.require_preimage = require_preimage;
        self
    }

    pub fn wallet(&self) -> &A {
        &self.wallet
    }

    pub fn counterparty(&self) -> &B {
        &self.counterparty
    }

    async fn execute(&self) -> Result<ScenarioResult, ScenarioError> {
        let inbound = PaymentIntent::new(self.plan.amount, Direction::BToA)
            .at_step(NAME, Step::CreateInvoiceA)?;

        tracing::info!(
            step = %Step::CreateInvoiceA,
            amount = inbound.amount().to_sat(),
            correlation_id = %inbound.correlation_id(),
            "Creating invoice on the wallet under test"
        );

        let invoice = self
            .wallet
            .create_invoice(
                inbound.amount(),
                &inbound.memo(&format!("synthetic {}", inbound.direction())),
                self.invoice_expiry,
            )
            .await
            .at_step(NAME, Step::CreateInvoiceA)?;

        tracing::info!(
            step = %Step::PayFromB,
            invoice = invoice.preview(),
            "Paying invoice from counterparty"
        );

        let paid = self
            .counterparty
            .pay_invoice(invoice)
            .await
            .at_step(NAME, Step::PayFromB)?;

        tracing::debug!(
            step = %Step::SettleWait,
            delay = ?self.settle_delay,
            status = %paid.status,
            "Waiting for inbound payment to settle"
        );
        tokio::time::sleep(self.settle_delay).await;

        let balance = self
            .wallet
            .balance()
            .await
            .at_step(NAME, Step::QueryBalanceA)?;

        let Some(send_amount) = self.plan.return_amount(balance) else {
            let warning = format!(
                "balance of {} sats does not cover the {} sat buffer, skipping return leg",
                balance.to_sat(),
                self.plan.buffer.to_sat()
            );

            return Ok(ScenarioResult::warning(
                NAME,
                Step::QueryBalanceA.as_str(),
                warning,
            ));
        };

        tracing::info!(
            step = %Step::QueryBalanceA,
            balance = balance.to_sat(),
            buffer = self.plan.buffer.to_sat(),
            send_amount = send_amount.to_sat(),
            "Sending balance back"
        );

        let outbound = PaymentIntent::new(send_amount, Direction::AToB)
            .at_step(NAME, Step::CreateInvoiceB)?;

        let invoice = self
            .counterparty
            .create_invoice(
                send_amount,
                &outbound.memo(&format!("synthetic {}", outbound.direction())),
                self.invoice_expiry,
            )
            .await
            .at_step(NAME, Step::CreateInvoiceB)?;

        let prepared = self
            .wallet
            .prepare_send(invoice, send_amount)
            .await
            .at_step(NAME, Step::PrepareAndSend)?;

        tracing::info!(
            step = %Step::PrepareAndSend,
            lightning_fee = prepared.fees.lightning_fee.to_sat(),
            transfer_fee = prepared.fees.transfer_fee.to_sat(),
            total_fee = prepared.fees.total().to_sat(),
            "Fees discovered"
        );

        let sent = self
            .wallet
            .send(prepared)
            .await
            .at_step(NAME, Step::PrepareAndSend)?;

        let payment_id = sent.payment_id.ok_or_else(|| {
            ScenarioError::new(
                NAME,
                Step::PrepareAndSend.as_str(),
                FailureKind::Provider,
                "send returned no payment id",
            )
        })?;

        let outcome = self
            .poller
            .await_terminal(&self.wallet, &payment_id)
            .await
            .at_step(NAME, Step::AwaitTerminal)?;

        match outcome.status {
            PaymentStatus::Completed => {
                if self.require_preimage && outcome.preimage.is_none() {
                    return Err(ScenarioError::new(
                        NAME,
                        Step::AwaitTerminal.as_str(),
                        FailureKind::MissingProof,
                        format!("payment {payment_id} completed without a preimage"),
                    ));
                }

                Ok(ScenarioResult::success(NAME, Step::AwaitTerminal.as_str()))
            }
            PaymentStatus::Failed => Err(ScenarioError::new(
                NAME,
                Step::AwaitTerminal.as_str(),
                FailureKind::PaymentFailed,
                format!("payment {payment_id} failed"),
            )),
            PaymentStatus::Pending | PaymentStatus::Unknown => {
                let waited = self.poller.timeout();

                Err(ScenarioError::from_error(
                    NAME,
                    Step::AwaitTerminal.as_str(),
                    &Error::DeadlineExceeded { payment_id, waited },
                ))
            }
        }
    }
}

#[async_trait]
impl<A, B> Scenario for LightningSwap<A, B>
where
    A: Wallet + Send + Sync,
    B: Lightning + Send + Sync,
{
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Lightning payments between Spark and Blink"
    }

    async fn run(&self) -> ScenarioResult {
        self.execute().await.unwrap_or_else(ScenarioResult::failed)
    }
}
