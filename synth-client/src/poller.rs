use crate::provider::Wallet;
use std::time::Duration;
use synth_core::Error;
use synth_core::PaymentId;
use synth_core::PaymentOutcome;
use tokio::time::Instant;

/// Waits for an outgoing payment to settle by polling its status.
#[derive(Debug, Clone, Copy)]
pub struct SettlementPoller {
    timeout: Duration,
    poll_interval: Duration,
}

impl SettlementPoller {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll `payment_id` until it is completed or failed, or the timeout elapses.
    ///
    /// A missing payment record and a pending status are retried after the poll interval. If
    /// the deadline passes first, the outcome is [`PaymentStatus::Unknown`]: the payment may
    /// still settle, we just stopped looking.
    ///
    /// # Errors
    ///
    /// Any error other than [`Error::StorageNotYetAvailable`] ends polling immediately.
    ///
    /// [`PaymentStatus::Unknown`]: synth_core::PaymentStatus::Unknown
    pub async fn await_terminal<W>(
        &self,
        wallet: &W,
        payment_id: &PaymentId,
    ) -> Result<PaymentOutcome, Error>
    where
        W: Wallet + ?Sized + Sync,
    {
        let started = Instant::now();
        // A timeout too large to represent never expires.
        let deadline = started.checked_add(self.timeout);
        let mut attempt = 0u32;

        loop {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                break;
            }

            attempt += 1;

            match wallet.payment_status(payment_id).await {
                Ok(outcome) if outcome.status.is_terminal() => {
                    tracing::info!(
                        %payment_id,
                        status = %outcome.status,
                        attempt,
                        elapsed = ?started.elapsed(),
                        "Payment reached terminal status"
                    );

                    return Ok(outcome);
                }
                Ok(outcome) => {
                    tracing::debug!(
                        %payment_id,
                        status = %outcome.status,
                        attempt,
                        "Payment not settled yet"
                    );
                }
                Err(e) if e.is_transient() => {
                    tracing::debug!(%payment_id, attempt, "Payment not recorded yet");
                }
                Err(e) => {
                    tracing::warn!(%payment_id, attempt, "Failed to query payment status: {e}");

                    return Err(e);
                }
            }

            let remaining = deadline.map_or(self.poll_interval, |deadline| {
                deadline.saturating_duration_since(Instant::now())
            });
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }

        tracing::warn!(
            %payment_id,
            attempt,
            timeout = ?self.timeout,
            "Gave up waiting for payment to settle"
        );

        Ok(PaymentOutcome::unknown(payment_id.clone()))
    }
}
