//! Domain model for the Spark/Blink Lightning synthetic checks.
//!
//! Nothing in this crate performs I/O. Provider clients, polling and scenario execution live in
//! `synth-client`; this crate only describes what flows between them.

pub mod alert;
pub mod payment;
pub mod plan;
pub mod scenario;

mod error;

pub use alert::NotificationBatch;
pub use error::Error;
pub use error::ErrorContext;
pub use payment::Credential;
pub use payment::Direction;
pub use payment::FeeBreakdown;
pub use payment::InvoiceHandle;
pub use payment::PaymentId;
pub use payment::PaymentIntent;
pub use payment::PaymentOutcome;
pub use payment::PaymentStatus;
pub use payment::PreparedSend;
pub use plan::AmountBand;
pub use plan::SwapPlan;
pub use scenario::FailureKind;
pub use scenario::Outcome;
pub use scenario::ScenarioError;
pub use scenario::ScenarioResult;

pub use bitcoin::Amount;
