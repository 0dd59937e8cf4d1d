//! The seams between scenarios and the wallet providers they exercise.
//!
//! Every method issues exactly one outbound request. Implementations keep no state between calls
//! besides their credentials, and label every failure with the provider operation it happened
//! at.

use std::future::Future;
use std::time::Duration;
use synth_core::Amount;
use synth_core::Credential;
use synth_core::Error;
use synth_core::InvoiceHandle;
use synth_core::PaymentId;
use synth_core::PaymentIntent;
use synth_core::PaymentOutcome;
use synth_core::PreparedSend;

/// Receive and pay Lightning invoices.
pub trait Lightning {
    /// Issue a BOLT11 invoice for `amount`.
    ///
    /// # Errors
    ///
    /// [`Error::Provider`] if the provider rejects the request or answers with a non-success
    /// status.
    fn create_invoice(
        &self,
        amount: Amount,
        memo: &str,
        expiry: Duration,
    ) -> impl Future<Output = Result<InvoiceHandle, Error>> + Send;

    /// Pay an invoice issued by the other provider.
    ///
    /// Returns as soon as the provider has accepted the payment, usually with a
    /// [`PaymentStatus::Pending`](synth_core::PaymentStatus::Pending) outcome.
    ///
    /// # Errors
    ///
    /// [`Error::Provider`] on transport failures and on business errors embedded in a successful
    /// response.
    fn pay_invoice(
        &self,
        invoice: InvoiceHandle,
    ) -> impl Future<Output = Result<PaymentOutcome, Error>> + Send;
}

/// A Lightning wallet we can inspect: the system under test.
pub trait Wallet: Lightning {
    /// Spendable balance.
    fn balance(&self) -> impl Future<Output = Result<Amount, Error>> + Send;

    /// Discover the fees for paying `invoice` with `amount`, without sending anything.
    fn prepare_send(
        &self,
        invoice: InvoiceHandle,
        amount: Amount,
    ) -> impl Future<Output = Result<PreparedSend, Error>> + Send;

    /// Submit a prepared send. The outcome carries the payment id to poll.
    fn send(
        &self,
        prepared: PreparedSend,
    ) -> impl Future<Output = Result<PaymentOutcome, Error>> + Send;

    /// Current state of an outgoing payment.
    ///
    /// # Errors
    ///
    /// [`Error::StorageNotYetAvailable`] while the provider has accepted the payment but not yet
    /// persisted a record for it. [`Error::Provider`] for everything else.
    fn payment_status(
        &self,
        payment_id: &PaymentId,
    ) -> impl Future<Output = Result<PaymentOutcome, Error>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub id: String,
}

/// Same-network balance transfers between wallets of one provider.
pub trait Transfers {
    /// Move `intent.amount()` from the wallet behind `from` to `to`.
    ///
    /// # Errors
    ///
    /// [`Error::Provider`] if the transport fails, the status is not a success, or the body
    /// reports an error. Any one of these signals fails the transfer.
    fn transfer(
        &self,
        from: &Credential,
        to: &str,
        intent: &PaymentIntent,
    ) -> impl Future<Output = Result<TransferReceipt, Error>> + Send;
}
