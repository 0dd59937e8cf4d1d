#![allow(dead_code, clippy::unwrap_used)]

use std::env;
use std::sync::Once;
use std::time::Duration;
use synth_client::blink::DEFAULT_URL as BLINK_URL;
use synth_client::build_http_client;
use synth_client::BlinkClient;
use synth_client::SettlementPoller;
use synth_client::SparkAccount;
use synth_client::SparkClient;
use synth_client::SparkNetwork;
use synth_core::Credential;

static INIT: Once = Once::new();

const BLINK_WALLET_ID: &str = "c4a7c8f6-1ed6-4246-9715-e92222e9a87f";

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                "debug,\
                 tower=info,\
                 hyper_util=info,\
                 hyper=info,\
                 h2=warn,\
                 reqwest=info,\
                 rustls=info",
            )
            .with_test_writer()
            .init()
    });
}

fn var(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("{name} must be set for live tests"))
}

fn http() -> reqwest::Client {
    build_http_client(Duration::from_secs(30)).unwrap()
}

pub fn spark() -> SparkClient {
    let base_url =
        env::var("SPARK_BASE_URL").unwrap_or_else(|_| "https://sparkproxy.kevz.dev".to_string());

    SparkClient::new(http(), base_url, SparkNetwork::Mainnet)
}

pub fn blink() -> BlinkClient {
    let wallet_id = env::var("BLINK_WALLET_ID").unwrap_or_else(|_| BLINK_WALLET_ID.to_string());

    BlinkClient::new(
        http(),
        BLINK_URL,
        Credential::new(var("BLINK_API_KEY")),
        wallet_id,
    )
}

pub fn account_a() -> SparkAccount {
    SparkAccount {
        credential: Credential::new(var("SPARK_MNEMONIC_A")),
        address: var("SPARK_ADDRESS_A"),
    }
}

pub fn account_b() -> SparkAccount {
    SparkAccount {
        credential: Credential::new(var("SPARK_MNEMONIC_B")),
        address: var("SPARK_ADDRESS_B"),
    }
}

pub fn swap_wallet() -> Credential {
    Credential::new(var("SPARK_MNEMONIC_SWAP"))
}

pub fn poller() -> SettlementPoller {
    SettlementPoller::new(Duration::from_secs(120), Duration::from_secs(3))
}
