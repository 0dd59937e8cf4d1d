#![allow(dead_code, clippy::unwrap_used)]

//! Scripted in-memory providers.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use synth_client::Lightning;
use synth_client::TransferReceipt;
use synth_client::Transfers;
use synth_client::Wallet;
use synth_core::Amount;
use synth_core::Credential;
use synth_core::Error;
use synth_core::FeeBreakdown;
use synth_core::InvoiceHandle;
use synth_core::PaymentId;
use synth_core::PaymentIntent;
use synth_core::PaymentOutcome;
use synth_core::PaymentStatus;
use synth_core::PreparedSend;

/// Replies handed out in order; the last one repeats once the others are used up.
#[derive(Debug)]
pub struct Script<T> {
    replies: Mutex<VecDeque<T>>,
    calls: Mutex<usize>,
}

impl<T: Clone> Script<T> {
    pub fn new(replies: impl IntoIterator<Item = T>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(0),
        }
    }

    pub fn next(&self) -> T {
        *self.calls.lock().unwrap() += 1;

        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().expect("script has at least one reply")
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

pub fn outcome(id: &str, status: PaymentStatus) -> PaymentOutcome {
    PaymentOutcome {
        payment_id: Some(PaymentId::new(id)),
        status,
        preimage: None,
        fees: None,
    }
}

pub fn completed_with_preimage(id: &str) -> PaymentOutcome {
    PaymentOutcome {
        preimage: Some("a3f1c09d5e7b2468".to_string()),
        ..outcome(id, PaymentStatus::Completed)
    }
}

pub fn not_yet_stored(id: &str) -> Error {
    Error::storage_not_yet_available(PaymentId::new(id))
}

/// The wallet under test.
pub struct FakeWallet {
    pub balance: Script<Result<Amount, Error>>,
    pub statuses: Script<Result<PaymentOutcome, Error>>,
    pub send_reply: Script<Result<PaymentOutcome, Error>>,
    pub fees: FeeBreakdown,
    pub invoices: Mutex<Vec<Amount>>,
    pub sent: Mutex<Vec<PreparedSend>>,
}

impl FakeWallet {
    pub fn new(balance: Amount) -> Self {
        Self {
            balance: Script::new([Ok(balance)]),
            statuses: Script::new([Ok(completed_with_preimage("send-1"))]),
            send_reply: Script::new([Ok(PaymentOutcome::pending(Some(PaymentId::new(
                "send-1",
            ))))]),
            fees: FeeBreakdown {
                lightning_fee: Amount::from_sat(2),
                transfer_fee: Amount::ZERO,
            },
            invoices: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_statuses(
        mut self,
        statuses: impl IntoIterator<Item = Result<PaymentOutcome, Error>>,
    ) -> Self {
        self.statuses = Script::new(statuses);
        self
    }

    pub fn with_send_reply(mut self, reply: Result<PaymentOutcome, Error>) -> Self {
        self.send_reply = Script::new([reply]);
        self
    }

    pub fn sent_amounts(&self) -> Vec<Amount> {
        self.sent.lock().unwrap().iter().map(|s| s.amount).collect()
    }
}

impl Lightning for FakeWallet {
    async fn create_invoice(
        &self,
        amount: Amount,
        _memo: &str,
        _expiry: Duration,
    ) -> Result<InvoiceHandle, Error> {
        self.invoices.lock().unwrap().push(amount);

        Ok(InvoiceHandle::new(format!("lnspark{}", amount.to_sat())))
    }

    async fn pay_invoice(&self, _invoice: InvoiceHandle) -> Result<PaymentOutcome, Error> {
        Ok(PaymentOutcome::pending(None))
    }
}

impl Wallet for FakeWallet {
    async fn balance(&self) -> Result<Amount, Error> {
        self.balance.next()
    }

    async fn prepare_send(
        &self,
        invoice: InvoiceHandle,
        amount: Amount,
    ) -> Result<PreparedSend, Error> {
        Ok(PreparedSend {
            invoice,
            amount,
            fees: self.fees,
        })
    }

    async fn send(&self, prepared: PreparedSend) -> Result<PaymentOutcome, Error> {
        self.sent.lock().unwrap().push(prepared);
        self.send_reply.next()
    }

    async fn payment_status(&self, _payment_id: &PaymentId) -> Result<PaymentOutcome, Error> {
        self.statuses.next()
    }
}

/// The counterparty.
pub struct FakeCounterparty {
    pub pay_reply: Script<Result<PaymentOutcome, Error>>,
    pub invoices: Mutex<Vec<Amount>>,
    pub paid: Mutex<Vec<InvoiceHandle>>,
}

impl FakeCounterparty {
    pub fn new() -> Self {
        Self {
            pay_reply: Script::new([Ok(PaymentOutcome {
                payment_id: None,
                status: PaymentStatus::Completed,
                preimage: None,
                fees: None,
            })]),
            invoices: Mutex::new(Vec::new()),
            paid: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pay_reply(mut self, reply: Result<PaymentOutcome, Error>) -> Self {
        self.pay_reply = Script::new([reply]);
        self
    }
}

impl Lightning for FakeCounterparty {
    async fn create_invoice(
        &self,
        amount: Amount,
        _memo: &str,
        _expiry: Duration,
    ) -> Result<InvoiceHandle, Error> {
        self.invoices.lock().unwrap().push(amount);

        Ok(InvoiceHandle::new(format!("lnblink{}", amount.to_sat())))
    }

    async fn pay_invoice(&self, invoice: InvoiceHandle) -> Result<PaymentOutcome, Error> {
        self.paid.lock().unwrap().push(invoice);
        self.pay_reply.next()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCall {
    pub from: String,
    pub to: String,
    pub amount: Amount,
    pub idempotency_key: String,
}

pub struct FakeTransfers {
    pub replies: Script<Result<(), Error>>,
    pub calls: Mutex<Vec<TransferCall>>,
}

impl FakeTransfers {
    pub fn new(replies: impl IntoIterator<Item = Result<(), Error>>) -> Self {
        Self {
            replies: Script::new(replies),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<TransferCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transfers for FakeTransfers {
    async fn transfer(
        &self,
        from: &Credential,
        to: &str,
        intent: &PaymentIntent,
    ) -> Result<TransferReceipt, Error> {
        self.calls.lock().unwrap().push(TransferCall {
            from: from.expose_secret().to_string(),
            to: to.to_string(),
            amount: intent.amount(),
            idempotency_key: intent.correlation_id().to_string(),
        });

        let id = format!("transfer-{}", self.calls.lock().unwrap().len());
        self.replies.next().map(|()| TransferReceipt { id })
    }
}
