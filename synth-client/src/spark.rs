//! Spark wallet HTTP API: provider A, the system under test.
//!
//! Every request identifies the wallet through the `spark-mnemonic` header, so one
//! [`SparkClient`] serves any number of wallets.

use crate::http::RawResponse;
use crate::provider::Lightning;
use crate::provider::TransferReceipt;
use crate::provider::Transfers;
use crate::provider::Wallet;
use reqwest::Method;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;
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

/// Fee cap applied to outgoing Lightning payments unless configured otherwise.
pub const DEFAULT_MAX_FEE: Amount = Amount::from_sat(10);

const CREATE_INVOICE: &str = "spark_create_invoice";
const PAY_INVOICE: &str = "spark_pay_invoice";
const FEE_ESTIMATE: &str = "spark_fee_estimate";
const BALANCE: &str = "spark_balance";
const PAYMENT_STATUS: &str = "spark_payment_status";
const TRANSFER: &str = "spark_transfer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SparkNetwork {
    Mainnet,
    Regtest,
}

impl SparkNetwork {
    fn header_value(&self) -> &'static str {
        match self {
            SparkNetwork::Mainnet => "MAINNET",
            SparkNetwork::Regtest => "REGTEST",
        }
    }
}

/// A Spark wallet together with the address other wallets send to.
#[derive(Debug, Clone)]
pub struct SparkAccount {
    pub credential: Credential,
    pub address: String,
}

#[derive(Debug, Clone)]
pub struct SparkClient {
    client: reqwest::Client,
    base_url: String,
    network: SparkNetwork,
    max_fee: Amount,
}

impl SparkClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        network: SparkNetwork,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            base_url,
            network,
            max_fee: DEFAULT_MAX_FEE,
        }
    }

    /// Refuse to send Lightning payments whose estimated fee exceeds `max_fee`.
    pub fn with_max_fee(mut self, max_fee: Amount) -> Self {
        self.max_fee = max_fee;
        self
    }

    /// Handle on the wallet behind `credential`.
    pub fn wallet(&self, credential: Credential) -> SparkWallet {
        SparkWallet {
            client: self.clone(),
            credential,
        }
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        credential: &Credential,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}/wallet/{path}", self.base_url);

        self.client
            .request(method, url)
            .header("accept", "application/json")
            .header("spark-network", self.network.header_value())
            .header("spark-mnemonic", credential.expose_secret())
    }

    /// The correlation id doubles as the idempotency key, so a retried leg cannot pay twice.
    fn transfer_request(
        &self,
        from: &Credential,
        to: &str,
        intent: &PaymentIntent,
    ) -> reqwest::RequestBuilder {
        let request = TransferRequest {
            amount_sats: intent.amount().to_sat(),
            receiver_spark_address: to.to_string(),
        };

        self.request(Method::POST, "transfer", from)
            .header("idempotency-key", intent.correlation_id().to_string())
            .json(&request)
    }
}

impl Transfers for SparkClient {
    async fn transfer(
        &self,
        from: &Credential,
        to: &str,
        intent: &PaymentIntent,
    ) -> Result<TransferReceipt, Error> {
        let raw = RawResponse::execute(TRANSFER, self.transfer_request(from, to, intent)).await?;

        let receipt = transfer_receipt(&raw)?;

        tracing::info!(
            transfer_id = %receipt.id,
            amount = intent.amount().to_sat(),
            direction = %intent.direction(),
            "Spark transfer accepted"
        );

        Ok(receipt)
    }
}

/// One Spark wallet.
#[derive(Debug, Clone)]
pub struct SparkWallet {
    client: SparkClient,
    credential: Credential,
}

impl SparkWallet {
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, path, &self.credential)
    }

    fn send_request(&self, prepared: &PreparedSend) -> reqwest::RequestBuilder {
        let request = PayInvoiceRequest {
            invoice: prepared.invoice.payment_request.clone(),
            max_fee_sats: self.client.max_fee.to_sat(),
            amount_sats: Some(prepared.amount.to_sat()),
        };

        self.request(Method::POST, "lightning/pay").json(&request)
    }
}

impl Lightning for SparkWallet {
    async fn create_invoice(
        &self,
        amount: Amount,
        memo: &str,
        expiry: Duration,
    ) -> Result<InvoiceHandle, Error> {
        let request = CreateInvoiceRequest {
            amount: amount.to_sat(),
            memo: memo.to_string(),
            expiry_seconds: expiry.as_secs(),
        };

        let response: CreateInvoiceResponse = RawResponse::execute(
            CREATE_INVOICE,
            self.request(Method::POST, "lightning/create").json(&request),
        )
        .await?
        .decode(CREATE_INVOICE)?;

        Ok(InvoiceHandle::new(response.invoice))
    }

    async fn pay_invoice(&self, invoice: InvoiceHandle) -> Result<PaymentOutcome, Error> {
        let request = PayInvoiceRequest {
            invoice: invoice.payment_request,
            max_fee_sats: self.client.max_fee.to_sat(),
            amount_sats: None,
        };

        let response: PayInvoiceResponse = RawResponse::execute(
            PAY_INVOICE,
            self.request(Method::POST, "lightning/pay").json(&request),
        )
        .await?
        .decode(PAY_INVOICE)?;

        Ok(PaymentOutcome::pending(Some(response.id)))
    }
}

impl Wallet for SparkWallet {
    async fn balance(&self) -> Result<Amount, Error> {
        let response: BalanceResponse =
            RawResponse::execute(BALANCE, self.request(Method::GET, "balance"))
                .await?
                .decode(BALANCE)?;

        Ok(Amount::from_sat(response.balance))
    }

    async fn prepare_send(
        &self,
        invoice: InvoiceHandle,
        amount: Amount,
    ) -> Result<PreparedSend, Error> {
        let request = FeeEstimateRequest {
            invoice: invoice.payment_request.clone(),
            amount_sats: amount.to_sat(),
        };

        let response: FeeEstimateResponse = RawResponse::execute(
            FEE_ESTIMATE,
            self.request(Method::POST, "lightning/fee-estimate")
                .json(&request),
        )
        .await?
        .decode(FEE_ESTIMATE)?;

        let fees = FeeBreakdown {
            lightning_fee: Amount::from_sat(response.lightning_fee_sats),
            transfer_fee: Amount::from_sat(response.spark_transfer_fee_sats),
        };
        check_fee_cap(&fees, self.client.max_fee)?;

        Ok(PreparedSend {
            invoice,
            amount,
            fees,
        })
    }

    async fn send(&self, prepared: PreparedSend) -> Result<PaymentOutcome, Error> {
        let response: PayInvoiceResponse =
            RawResponse::execute(PAY_INVOICE, self.send_request(&prepared))
                .await?
                .decode(PAY_INVOICE)?;

        let mut outcome = PaymentOutcome::pending(Some(response.id));
        outcome.fees = Some(prepared.fees);

        Ok(outcome)
    }

    async fn payment_status(&self, payment_id: &PaymentId) -> Result<PaymentOutcome, Error> {
        let raw = RawResponse::execute(
            PAYMENT_STATUS,
            self.request(Method::GET, &format!("lightning/pay/{payment_id}")),
        )
        .await?;

        payment_outcome(&raw, payment_id)
    }
}

fn check_fee_cap(fees: &FeeBreakdown, max_fee: Amount) -> Result<(), Error> {
    if fees.total() > max_fee {
        return Err(Error::provider(
            FEE_ESTIMATE,
            format!(
                "estimated fee of {} sats exceeds the cap of {} sats",
                fees.total().to_sat(),
                max_fee.to_sat()
            ),
        ));
    }

    Ok(())
}

fn payment_outcome(raw: &RawResponse, payment_id: &PaymentId) -> Result<PaymentOutcome, Error> {
    // The send request is only queryable once Spark has persisted it.
    if raw.status == StatusCode::NOT_FOUND && !raw.is_gateway_page() {
        return Err(Error::storage_not_yet_available(payment_id.clone()));
    }

    let response: PaymentResponse = raw.decode(PAYMENT_STATUS)?;

    Ok(PaymentOutcome {
        payment_id: Some(response.id),
        status: parse_payment_status(&response.status),
        preimage: response.preimage,
        fees: response.fee_sats.map(|fee| FeeBreakdown {
            lightning_fee: Amount::from_sat(fee),
            transfer_fee: Amount::ZERO,
        }),
    })
}

fn parse_payment_status(status: &str) -> PaymentStatus {
    match status {
        "LIGHTNING_PAYMENT_SUCCEEDED" | "PREIMAGE_PROVIDED" | "TRANSFER_COMPLETED" => {
            PaymentStatus::Completed
        }
        "LIGHTNING_PAYMENT_FAILED"
        | "USER_TRANSFER_VALIDATION_FAILED"
        | "USER_SWAP_RETURNED"
        | "USER_SWAP_RETURN_FAILED" => PaymentStatus::Failed,
        other => {
            tracing::trace!(status = other, "Treating Spark send status as pending");
            PaymentStatus::Pending
        }
    }
}

/// A transfer only succeeds if the status is a success and the body mentions no error.
fn transfer_receipt(raw: &RawResponse) -> Result<TransferReceipt, Error> {
    raw.ensure_success(TRANSFER)?;

    if raw.body.contains("error") {
        return Err(Error::provider(TRANSFER, raw.body.clone()));
    }

    let response: TransferResponse = raw.decode(TRANSFER)?;

    Ok(TransferReceipt { id: response.id })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateInvoiceRequest {
    amount: u64,
    memo: String,
    expiry_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateInvoiceResponse {
    invoice: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeeEstimateRequest {
    invoice: String,
    amount_sats: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeEstimateResponse {
    lightning_fee_sats: u64,
    #[serde(default)]
    spark_transfer_fee_sats: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PayInvoiceRequest {
    invoice: String,
    max_fee_sats: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount_sats: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct PayInvoiceResponse {
    id: PaymentId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentResponse {
    id: PaymentId,
    status: String,
    #[serde(default)]
    preimage: Option<String>,
    #[serde(default)]
    fee_sats: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct BalanceResponse {
    balance: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferRequest {
    amount_sats: u64,
    receiver_spark_address: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TransferResponse {
    id: String,
}
