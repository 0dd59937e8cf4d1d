#![allow(clippy::unwrap_used)]

use common::FakeTransfers;
use std::time::Duration;
use synth_client::RoundTripTransfer;
use synth_client::Scenario;
use synth_client::SparkAccount;
use synth_core::Amount;
use synth_core::Credential;
use synth_core::Error;
use synth_core::FailureKind;
use synth_core::Outcome;

mod common;

fn account(name: &str) -> SparkAccount {
    SparkAccount {
        credential: Credential::new(format!("mnemonic-{name}")),
        address: format!("sp1{name}"),
    }
}

fn round_trip(transfers: FakeTransfers) -> RoundTripTransfer<FakeTransfers> {
    RoundTripTransfer::new(transfers, account("a"), account("b"), Amount::from_sat(42))
        .with_delay(Duration::from_secs(5))
}

#[tokio::test(start_paused = true)]
async fn both_legs_succeed() {
    let scenario = round_trip(FakeTransfers::new([Ok(())]));

    let result = scenario.run().await;

    assert_eq!(result.outcome, Outcome::Success);
    assert_eq!(result.operation, "transfer_back");

    let calls = scenario.transfers().calls();
    assert_eq!(calls.len(), 2);
    assert_eq!((calls[0].from.as_str(), calls[0].to.as_str()), ("mnemonic-a", "sp1b"));
    assert_eq!((calls[1].from.as_str(), calls[1].to.as_str()), ("mnemonic-b", "sp1a"));
    assert!(calls.iter().all(|c| c.amount == Amount::from_sat(42)));
    assert_ne!(calls[0].idempotency_key, calls[1].idempotency_key);
}

#[tokio::test(start_paused = true)]
async fn failed_first_leg_skips_the_second() {
    let scenario = round_trip(FakeTransfers::new([Err(Error::provider(
        "spark_transfer",
        r#"{"error":"insufficient balance"}"#,
    ))]));

    let result = scenario.run().await;

    let err = result.error().unwrap();
    assert_eq!(err.scenario, "spark-transfer");
    assert_eq!(err.operation, "transfer_out");
    assert_eq!(err.kind, FailureKind::Provider);
    assert_eq!(scenario.transfers().calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_second_leg_is_an_error() {
    let scenario = round_trip(FakeTransfers::new([
        Ok(()),
        Err(Error::provider("spark_transfer", "HTTP 502: bad gateway")),
    ]));

    let result = scenario.run().await;

    let err = result.error().unwrap();
    assert_eq!(err.operation, "transfer_back");
    assert_eq!(scenario.transfers().calls().len(), 2);
}
