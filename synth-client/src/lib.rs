//! Clients and orchestration for the Lightning interoperability synthetic checks.
//!
//! Provider A is a Spark wallet reached through its HTTP API ([`SparkClient`]), provider B is
//! Blink's GraphQL API ([`BlinkClient`]). Scenarios drive both, wait for settlement through the
//! [`SettlementPoller`] and each produce one [`ScenarioResult`]; [`notify`] turns the failures of
//! a run into at most one alert.

pub mod blink;
pub mod notifier;
pub mod poller;
pub mod provider;
pub mod scenario;
pub mod spark;

mod http;

pub use blink::BlinkClient;
pub use http::build_http_client;
pub use notifier::notify;
pub use notifier::Delivery;
pub use notifier::LogNotifier;
pub use notifier::Notifier;
pub use notifier::NotifyReport;
pub use notifier::SlackWebhook;
pub use poller::SettlementPoller;
pub use provider::Lightning;
pub use provider::TransferReceipt;
pub use provider::Transfers;
pub use provider::Wallet;
pub use scenario::run_all;
pub use scenario::LightningSwap;
pub use scenario::RoundTripTransfer;
pub use scenario::Scenario;
pub use scenario::Step;
pub use spark::SparkAccount;
pub use spark::SparkClient;
pub use spark::SparkNetwork;
pub use spark::SparkWallet;

pub use synth_core::Error;
pub use synth_core::ScenarioResult;
