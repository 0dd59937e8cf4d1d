use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use synth_client::SparkAccount;
use synth_client::SparkNetwork;
use synth_core::Amount;
use synth_core::AmountBand;
use synth_core::Credential;

/// Upper bound on every `[timing]` value.
const MAX_TIMING_SECS: u64 = 86_400;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Shown in alerts, e.g. `mainnet`.
    pub environment: String,
    #[serde(default)]
    pub spark: SparkConfig,
    #[serde(default)]
    pub blink: BlinkConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub amounts: AmountsConfig,
    #[serde(default)]
    pub require_preimage: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SparkConfig {
    pub base_url: String,
    pub network: SparkNetwork,
}

impl Default for SparkConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sparkproxy.kevz.dev".to_string(),
            network: SparkNetwork::Mainnet,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlinkConfig {
    pub url: String,
    pub wallet_id: String,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            url: synth_client::blink::DEFAULT_URL.to_string(),
            wallet_id: "c4a7c8f6-1ed6-4246-9715-e92222e9a87f".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    pub request_timeout_secs: u64,
    pub settle_delay_secs: u64,
    pub transfer_delay_secs: u64,
    pub poll_interval_secs: u64,
    pub settlement_timeout_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            settle_delay_secs: 10,
            transfer_delay_secs: 5,
            poll_interval_secs: 3,
            settlement_timeout_secs: 120,
        }
    }
}

impl TimingConfig {
    fn fields(&self) -> [(&'static str, u64); 5] {
        [
            ("request_timeout_secs", self.request_timeout_secs),
            ("settle_delay_secs", self.settle_delay_secs),
            ("transfer_delay_secs", self.transfer_delay_secs),
            ("poll_interval_secs", self.poll_interval_secs),
            ("settlement_timeout_secs", self.settlement_timeout_secs),
        ]
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn transfer_delay(&self) -> Duration {
        Duration::from_secs(self.transfer_delay_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn settlement_timeout(&self) -> Duration {
        Duration::from_secs(self.settlement_timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmountsConfig {
    pub swap_base_sats: u64,
    pub swap_jitter_sats: u64,
    pub buffer_base_sats: u64,
    pub buffer_jitter_sats: u64,
    pub transfer_min_sats: u64,
    pub transfer_max_sats: u64,
    pub max_fee_sats: u64,
    pub invoice_expiry_secs: u64,
}

impl Default for AmountsConfig {
    fn default() -> Self {
        Self {
            swap_base_sats: 1_000,
            swap_jitter_sats: 500,
            buffer_base_sats: 100,
            buffer_jitter_sats: 50,
            transfer_min_sats: 10,
            transfer_max_sats: 100,
            max_fee_sats: 10,
            invoice_expiry_secs: 86_400,
        }
    }
}

impl AmountsConfig {
    pub fn swap_band(&self) -> AmountBand {
        AmountBand::new(
            Amount::from_sat(self.swap_base_sats),
            Amount::from_sat(self.swap_jitter_sats),
        )
    }

    pub fn buffer_band(&self) -> AmountBand {
        AmountBand::new(
            Amount::from_sat(self.buffer_base_sats),
            Amount::from_sat(self.buffer_jitter_sats),
        )
    }

    pub fn transfer_band(&self) -> Result<AmountBand> {
        let band = AmountBand::between(
            Amount::from_sat(self.transfer_min_sats),
            Amount::from_sat(self.transfer_max_sats),
        )?;

        Ok(band)
    }

    pub fn max_fee(&self) -> Amount {
        Amount::from_sat(self.max_fee_sats)
    }

    pub fn invoice_expiry(&self) -> Duration {
        Duration::from_secs(self.invoice_expiry_secs)
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        Self::parse(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    fn parse(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.environment.trim().is_empty() {
            bail!("environment must not be empty");
        }

        if self.timing.poll_interval_secs == 0 {
            bail!("timing.poll_interval_secs must be positive");
        }

        if self.timing.request_timeout_secs == 0 {
            bail!("timing.request_timeout_secs must be positive");
        }

        for (name, secs) in self.timing.fields() {
            if secs > MAX_TIMING_SECS {
                bail!("timing.{name} must be at most {MAX_TIMING_SECS}, got {secs}");
            }
        }

        if self.amounts.swap_base_sats == 0 || self.amounts.transfer_min_sats == 0 {
            bail!("payment amounts must be positive");
        }

        self.amounts.transfer_band()?;

        Ok(())
    }
}

/// Credentials read from the environment. None of them ever goes into the config file.
///
/// The swap drains its wallet down to a buffer, so that wallet must not be one of the transfer
/// pair.
pub struct Secrets {
    pub spark_a: SparkAccount,
    pub spark_b: SparkAccount,
    pub spark_swap: Credential,
    pub blink_api_key: Credential,
    pub slack_webhook: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        let secrets = Self {
            spark_a: SparkAccount {
                credential: Credential::new(required("SPARK_MNEMONIC_A")?),
                address: required("SPARK_ADDRESS_A")?,
            },
            spark_b: SparkAccount {
                credential: Credential::new(required("SPARK_MNEMONIC_B")?),
                address: required("SPARK_ADDRESS_B")?,
            },
            spark_swap: Credential::new(required("SPARK_MNEMONIC_SWAP")?),
            blink_api_key: Credential::new(required("BLINK_API_KEY")?),
            slack_webhook: env::var("SLACK_WEBHOOK").ok().filter(|url| !url.is_empty()),
        };
        secrets.validate()?;

        Ok(secrets)
    }

    fn validate(&self) -> Result<()> {
        let swap = self.spark_swap.expose_secret();

        if swap == self.spark_a.credential.expose_secret()
            || swap == self.spark_b.credential.expose_secret()
        {
            bail!("SPARK_MNEMONIC_SWAP must name a wallet not used by the transfer pair");
        }

        Ok(())
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("missing environment variable {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::parse(r#"environment = "mainnet""#).expect("valid config");

        assert_eq!(config.spark.network, SparkNetwork::Mainnet);
        assert_eq!(config.timing.poll_interval(), Duration::from_secs(3));
        assert_eq!(config.amounts.max_fee(), Amount::from_sat(10));
        assert!(!config.require_preimage);
    }

    #[test]
    fn sections_override_defaults() {
        let raw = r#"
environment = "regtest"
require_preimage = true

[spark]
base_url = "http://localhost:3000"
network = "REGTEST"

[timing]
settlement_timeout_secs = 30

[amounts]
transfer_min_sats = 20
transfer_max_sats = 20
"#;

        let config = Config::parse(raw).expect("valid config");

        assert_eq!(config.spark.network, SparkNetwork::Regtest);
        assert_eq!(config.spark.base_url, "http://localhost:3000");
        assert_eq!(config.timing.settlement_timeout(), Duration::from_secs(30));
        assert_eq!(config.timing.poll_interval(), Duration::from_secs(3));
        assert_eq!(
            config.amounts.transfer_band().expect("band").max(),
            Amount::from_sat(20)
        );
        assert!(config.require_preimage);
    }

    #[test]
    fn inverted_transfer_range_is_rejected() {
        let raw = r#"
environment = "mainnet"

[amounts]
transfer_min_sats = 100
transfer_max_sats = 10
"#;

        assert!(Config::parse(raw).is_err());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let raw = r#"
environment = "mainnet"

[timing]
poll_interval_secs = 0
"#;

        assert!(Config::parse(raw).is_err());
    }

    #[test]
    fn unbounded_settlement_timeout_is_rejected() {
        let raw = r#"
environment = "mainnet"

[timing]
settlement_timeout_secs = 9223372036854775807
"#;

        let err = Config::parse(raw).expect_err("timeout too large");

        assert!(err.to_string().contains("settlement_timeout_secs"));
    }

    #[test]
    fn day_long_delays_are_accepted() {
        let raw = r#"
environment = "mainnet"

[timing]
settle_delay_secs = 86400
settlement_timeout_secs = 86400
"#;

        assert!(Config::parse(raw).is_ok());
    }

    fn account(name: &str) -> SparkAccount {
        SparkAccount {
            credential: Credential::new(format!("{name} mnemonic")),
            address: format!("sp1{name}"),
        }
    }

    fn secrets(swap: &str) -> Secrets {
        Secrets {
            spark_a: account("a"),
            spark_b: account("b"),
            spark_swap: Credential::new(swap),
            blink_api_key: Credential::new("blink key"),
            slack_webhook: None,
        }
    }

    #[test]
    fn swap_wallet_must_differ_from_the_transfer_pair() {
        assert!(secrets("swap mnemonic").validate().is_ok());
        assert!(secrets("a mnemonic").validate().is_err());
        assert!(secrets("b mnemonic").validate().is_err());
    }

    #[test]
    fn environment_is_required() {
        assert!(Config::parse("").is_err());
    }
}
