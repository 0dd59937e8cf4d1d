use crate::Error;
use bitcoin::Amount;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Identifier a provider assigns to an outgoing payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque wallet secret (API key or mnemonic).
///
/// The value is only handed to the HTTP layer. It is never formatted.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Which way the sats move between the system under test (A) and the counterparty (B).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    AToB,
    BToA,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::AToB => f.write_str("A->B"),
            Direction::BToA => f.write_str("B->A"),
        }
    }
}

/// A single payment the scenario is about to attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    amount: Amount,
    direction: Direction,
    correlation_id: Uuid,
}

impl PaymentIntent {
    pub fn new(amount: Amount, direction: Direction) -> Result<Self, Error> {
        Self::with_correlation_id(amount, direction, Uuid::new_v4())
    }

    pub fn with_correlation_id(
        amount: Amount,
        direction: Direction,
        correlation_id: Uuid,
    ) -> Result<Self, Error> {
        if amount == Amount::ZERO {
            return Err(Error::config("payment amount must be positive"));
        }

        Ok(Self {
            amount,
            direction,
            correlation_id,
        })
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// Invoice memo carrying the first block of the correlation id, so a payment can be traced
    /// on both providers.
    pub fn memo(&self, label: &str) -> String {
        let id = self.correlation_id.simple().to_string();
        format!("{label} [{}]", &id[..8])
    }
}

/// A payment request issued by one provider and paid by the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceHandle {
    /// The encoded BOLT11 payment request.
    pub payment_request: String,
    pub payment_hash: Option<String>,
    pub payment_secret: Option<String>,
}

impl InvoiceHandle {
    pub fn new(payment_request: impl Into<String>) -> Self {
        Self {
            payment_request: payment_request.into(),
            payment_hash: None,
            payment_secret: None,
        }
    }

    /// First characters of the payment request, for logs.
    pub fn preview(&self) -> &str {
        let end = self
            .payment_request
            .char_indices()
            .nth(50)
            .map(|(i, _)| i)
            .unwrap_or(self.payment_request.len());

        &self.payment_request[..end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    /// Local state: the poll deadline passed without a terminal status.
    Unknown,
}

impl PaymentStatus {
    /// `Unknown` is not terminal; it only means we stopped looking.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Unknown => "unknown",
        };

        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeBreakdown {
    pub lightning_fee: Amount,
    pub transfer_fee: Amount,
}

impl FeeBreakdown {
    pub fn total(&self) -> Amount {
        self.lightning_fee + self.transfer_fee
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    /// Absent when the provider does not expose an identifier for the payment.
    pub payment_id: Option<PaymentId>,
    pub status: PaymentStatus,
    /// Settlement proof.
    pub preimage: Option<String>,
    pub fees: Option<FeeBreakdown>,
}

impl PaymentOutcome {
    pub fn pending(payment_id: Option<PaymentId>) -> Self {
        Self {
            payment_id,
            status: PaymentStatus::Pending,
            preimage: None,
            fees: None,
        }
    }

    pub fn unknown(payment_id: PaymentId) -> Self {
        Self {
            payment_id: Some(payment_id),
            status: PaymentStatus::Unknown,
            preimage: None,
            fees: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }
}

/// A send whose fees have been discovered but which has not been submitted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSend {
    pub invoice: InvoiceHandle,
    pub amount: Amount,
    pub fees: FeeBreakdown,
}
