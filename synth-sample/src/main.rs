mod config;

use crate::config::Config;
use crate::config::Secrets;
use anyhow::Result;
use clap::Parser;
use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use synth_client::build_http_client;
use synth_client::notify;
use synth_client::run_all;
use synth_client::BlinkClient;
use synth_client::LightningSwap;
use synth_client::LogNotifier;
use synth_client::Notifier;
use synth_client::RoundTripTransfer;
use synth_client::Scenario;
use synth_client::SettlementPoller;
use synth_client::SlackWebhook;
use synth_client::SparkClient;
use synth_core::SwapPlan;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "debug,\
     tower=info,\
     hyper_util=info,\
     hyper=info,\
     h2=warn,\
     reqwest=info,\
     rustls=info";

#[derive(Parser)]
#[command(name = "synth-runner")]
#[command(about = "Synthetic Lightning interoperability checks between Spark and Blink")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "synth.config.toml")]
    config: String,

    /// Seed for amount jitter. A fresh seed is drawn if absent.
    #[arg(long)]
    seed: Option<u64>,

    /// Scenarios to run. Defaults to all of them.
    #[arg(long = "scenario", value_enum)]
    scenarios: Vec<ScenarioKind>,

    /// Run the scenarios at the same time instead of one after another.
    #[arg(long)]
    concurrent: bool,

    /// Log as JSON lines.
    #[arg(long)]
    json: bool,

    /// Log the alert instead of posting it to the webhook.
    #[arg(long)]
    dry_run_notify: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScenarioKind {
    LightningSwap,
    SparkTransfer,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.json);

    let config = Config::load(&cli.config)?;
    let secrets = Secrets::from_env()?;

    let seed = cli.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = StdRng::seed_from_u64(seed);

    tracing::info!(environment = %config.environment, seed, "Starting synthetic run");

    let http = build_http_client(config.timing.request_timeout())?;

    let spark = SparkClient::new(http.clone(), &config.spark.base_url, config.spark.network)
        .with_max_fee(config.amounts.max_fee());
    let blink = BlinkClient::new(
        http.clone(),
        &config.blink.url,
        secrets.blink_api_key.clone(),
        &config.blink.wallet_id,
    );

    let selected = if cli.scenarios.is_empty() {
        vec![ScenarioKind::LightningSwap, ScenarioKind::SparkTransfer]
    } else {
        cli.scenarios.clone()
    };

    let mut scenarios: Vec<Box<dyn Scenario>> = Vec::new();
    for kind in selected {
        match kind {
            ScenarioKind::LightningSwap => {
                let plan = SwapPlan::sample(
                    &mut rng,
                    &config.amounts.swap_band(),
                    &config.amounts.buffer_band(),
                );
                let poller = SettlementPoller::new(
                    config.timing.settlement_timeout(),
                    config.timing.poll_interval(),
                );

                tracing::debug!(
                    amount = plan.amount.to_sat(),
                    buffer = plan.buffer.to_sat(),
                    "Planned lightning swap"
                );

                let swap = LightningSwap::new(
                    spark.wallet(secrets.spark_swap.clone()),
                    blink.clone(),
                    plan,
                    poller,
                )
                .with_settle_delay(config.timing.settle_delay())
                .with_invoice_expiry(config.amounts.invoice_expiry())
                .require_preimage(config.require_preimage);

                scenarios.push(Box::new(swap));
            }
            ScenarioKind::SparkTransfer => {
                let amount = config.amounts.transfer_band()?.sample(&mut rng);

                tracing::debug!(amount = amount.to_sat(), "Planned round-trip transfer");

                let transfer = RoundTripTransfer::new(
                    spark.clone(),
                    secrets.spark_a.clone(),
                    secrets.spark_b.clone(),
                    amount,
                )
                .with_delay(config.timing.transfer_delay());

                scenarios.push(Box::new(transfer));
            }
        }
    }

    let results = run_all(&scenarios, cli.concurrent).await;

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    tracing::info!(succeeded, total = results.len(), "Run finished");

    let errors = results
        .into_iter()
        .filter_map(|r| r.into_error())
        .collect::<Vec<_>>();

    let notifier: Option<Box<dyn Notifier>> = if cli.dry_run_notify {
        Some(Box::new(LogNotifier))
    } else {
        secrets
            .slack_webhook
            .map(|url| Box::new(SlackWebhook::new(http, url)) as Box<dyn Notifier>)
    };

    let report = notify(notifier.as_deref(), &config.environment, errors).await;

    std::process::exit(report.exit_code());
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init()
    }
}
