use crate::payment::PaymentId;
use crate::scenario::FailureKind;
use std::fmt::Display;
use std::time::Duration;

/// Everything that can go wrong while talking to a wallet provider or waiting for settlement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The provider rejected the request, the transport failed, or a business error was found
    /// inside an otherwise successful response.
    #[error("{operation} failed: {detail}")]
    Provider {
        operation: &'static str,
        detail: String,
    },
    /// A gateway in front of the provider answered with an HTML error page instead of JSON.
    ///
    /// This is almost always a proxy timeout and says nothing about payment logic.
    #[error("{operation} failed with HTTP {status}: {detail}")]
    Gateway {
        operation: &'static str,
        status: u16,
        detail: String,
    },
    /// The provider accepted the payment but has not written a queryable record for it yet.
    #[error("payment {payment_id} is not yet recorded by the provider")]
    StorageNotYetAvailable { payment_id: PaymentId },
    /// No terminal status was observed before the poll deadline.
    #[error("payment {payment_id} did not settle within {waited:?}")]
    DeadlineExceeded {
        payment_id: PaymentId,
        waited: Duration,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn provider(operation: &'static str, detail: impl Display) -> Self {
        Self::Provider {
            operation,
            detail: detail.to_string(),
        }
    }

    pub fn gateway(operation: &'static str, status: u16, detail: impl Display) -> Self {
        Self::Gateway {
            operation,
            status,
            detail: detail.to_string(),
        }
    }

    pub fn storage_not_yet_available(payment_id: PaymentId) -> Self {
        Self::StorageNotYetAvailable { payment_id }
    }

    pub fn config(detail: impl Display) -> Self {
        Self::Config(detail.to_string())
    }

    /// Only a missing payment record is worth retrying; every other failure is final.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StorageNotYetAvailable { .. })
    }

    /// The provider operation this error was raised at, if it came from a provider call.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Provider { operation, .. } | Self::Gateway { operation, .. } => Some(*operation),
            Self::StorageNotYetAvailable { .. } | Self::DeadlineExceeded { .. } | Self::Config(_) => {
                None
            }
        }
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Provider { .. } | Self::StorageNotYetAvailable { .. } => FailureKind::Provider,
            Self::Gateway { .. } => FailureKind::Gateway,
            Self::DeadlineExceeded { .. } => FailureKind::Deadline,
            Self::Config(_) => FailureKind::Config,
        }
    }
}

/// Attach a provider operation label to a lower-level error.
pub trait ErrorContext<T> {
    fn operation(self, operation: &'static str) -> Result<T, Error>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: Display,
{
    fn operation(self, operation: &'static str) -> Result<T, Error> {
        self.map_err(|e| Error::provider(operation, e))
    }
}
