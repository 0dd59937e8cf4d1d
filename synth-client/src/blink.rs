//! Blink GraphQL API: provider B, the counterparty.

use crate::http::RawResponse;
use crate::provider::Lightning;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use serde_json::Value;
use std::time::Duration;
use synth_core::Amount;
use synth_core::Credential;
use synth_core::Error;
use synth_core::InvoiceHandle;
use synth_core::PaymentOutcome;
use synth_core::PaymentStatus;

pub const DEFAULT_URL: &str = "https://api.blink.sv/graphql";

const CREATE_INVOICE: &str = "blink_create_invoice";
const PAY_INVOICE: &str = "blink_pay_invoice";

const LN_INVOICE_CREATE: &str = "mutation LnInvoiceCreate($input: LnInvoiceCreateInput!) {
  lnInvoiceCreate(input: $input) {
    invoice {
      paymentRequest
      paymentHash
      paymentSecret
      satoshis
    }
    errors {
      message
    }
  }
}";

const LN_INVOICE_PAYMENT_SEND: &str =
    "mutation LnInvoicePaymentSend($input: LnInvoicePaymentInput!) {
  lnInvoicePaymentSend(input: $input) {
    status
    errors {
      message
      path
      code
    }
  }
}";

#[derive(Debug, Clone)]
pub struct BlinkClient {
    client: reqwest::Client,
    url: String,
    api_key: Credential,
    wallet_id: String,
}

impl BlinkClient {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: Credential,
        wallet_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
            wallet_id: wallet_id.into(),
        }
    }

    fn mutation_request(&self, query: &str, input: Value) -> reqwest::RequestBuilder {
        let body = json!({
            "query": query,
            "variables": { "input": input },
        });

        self.client
            .post(&self.url)
            .header("content-type", "application/json")
            .header("X-API-KEY", self.api_key.expose_secret())
            .json(&body)
    }

    async fn mutation<T>(
        &self,
        operation: &'static str,
        field: &str,
        query: &str,
        input: Value,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let raw = RawResponse::execute(operation, self.mutation_request(query, input)).await?;

        let envelope: Envelope = raw.decode(operation)?;

        envelope.into_payload(operation, field)
    }
}

impl Lightning for BlinkClient {
    async fn create_invoice(
        &self,
        amount: Amount,
        memo: &str,
        expiry: Duration,
    ) -> Result<InvoiceHandle, Error> {
        let input = json!({
            "amount": amount.to_sat(),
            "walletId": self.wallet_id,
            "memo": memo,
            "expiresIn": expiry_minutes(expiry),
        });

        let payload: InvoiceCreatePayload = self
            .mutation(CREATE_INVOICE, "lnInvoiceCreate", LN_INVOICE_CREATE, input)
            .await?;

        payload.into_invoice()
    }

    async fn pay_invoice(&self, invoice: InvoiceHandle) -> Result<PaymentOutcome, Error> {
        tracing::debug!(invoice = invoice.preview(), "Paying invoice from Blink");

        let input = json!({
            "paymentRequest": invoice.payment_request,
            "walletId": self.wallet_id,
        });

        let payload: PaymentSendPayload = self
            .mutation(
                PAY_INVOICE,
                "lnInvoicePaymentSend",
                LN_INVOICE_PAYMENT_SEND,
                input,
            )
            .await?;

        payload.into_outcome()
    }
}

/// Blink counts invoice expiry in whole minutes.
fn expiry_minutes(expiry: Duration) -> u64 {
    expiry.as_secs().div_ceil(60).max(1)
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

impl Envelope {
    fn into_payload<T>(self, operation: &'static str, field: &str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        if !self.errors.is_empty() {
            return Err(Error::provider(operation, join_messages(&self.errors)));
        }

        let payload = self
            .data
            .and_then(|mut data| data.get_mut(field).map(Value::take))
            .filter(|payload| !payload.is_null())
            .ok_or_else(|| Error::provider(operation, format!("response carries no {field}")))?;

        serde_json::from_value(payload)
            .map_err(|e| Error::provider(operation, format!("unexpected {field} shape: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

fn join_messages(errors: &[GraphqlError]) -> String {
    errors
        .iter()
        .map(|e| match &e.code {
            Some(code) => format!("{code}: {}", e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Deserialize)]
struct InvoiceCreatePayload {
    invoice: Option<BlinkInvoice>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlinkInvoice {
    payment_request: String,
    payment_hash: Option<String>,
    payment_secret: Option<String>,
}

impl InvoiceCreatePayload {
    fn into_invoice(self) -> Result<InvoiceHandle, Error> {
        if !self.errors.is_empty() {
            return Err(Error::provider(CREATE_INVOICE, join_messages(&self.errors)));
        }

        let invoice = self
            .invoice
            .ok_or_else(|| Error::provider(CREATE_INVOICE, "no invoice returned"))?;

        Ok(InvoiceHandle {
            payment_request: invoice.payment_request,
            payment_hash: invoice.payment_hash,
            payment_secret: invoice.payment_secret,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PaymentSendPayload {
    status: Option<String>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

impl PaymentSendPayload {
    /// Blink does not hand out an id for the payment, so the outcome carries none.
    fn into_outcome(self) -> Result<PaymentOutcome, Error> {
        if !self.errors.is_empty() {
            return Err(Error::provider(PAY_INVOICE, join_messages(&self.errors)));
        }

        let status = match self.status.as_deref() {
            Some("SUCCESS") => PaymentStatus::Completed,
            Some("PENDING") => PaymentStatus::Pending,
            Some(other) => {
                return Err(Error::provider(
                    PAY_INVOICE,
                    format!("payment status {other}"),
                ))
            }
            None => return Err(Error::provider(PAY_INVOICE, "no payment status returned")),
        };

        Ok(PaymentOutcome {
            payment_id: None,
            status,
            preimage: None,
            fees: None,
        })
    }
}
