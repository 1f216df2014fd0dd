//! SumUp payment gateway client.
//!
//! Wraps the SumUp checkout API and translates its status vocabulary into
//! the internal tri-state at the boundary; SumUp-specific strings never
//! leave this module.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use domain::services::{
    CheckoutSession, CheckoutStatus, CheckoutStatusInfo, GatewayError, PaymentGateway,
};

use crate::config::GatewayConfig;

/// Request timeout for gateway calls.
const GATEWAY_TIMEOUT_SECS: u64 = 10;

/// Checkout creation request body.
#[derive(Debug, Serialize)]
struct CheckoutRequest<'a> {
    checkout_reference: &'a str,
    amount: f64,
    currency: &'a str,
    merchant_code: &'a str,
    description: &'a str,
    return_url: &'a str,
}

/// Checkout resource as returned by the gateway.
#[derive(Debug, Deserialize)]
struct CheckoutResponse {
    id: String,
    status: Option<String>,
    transaction_id: Option<String>,
}

/// A verified, parsed webhook notification.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub checkout_id: String,
    pub status: CheckoutStatus,
    pub transaction_id: Option<String>,
    pub amount: Option<f64>,
}

/// Raw webhook body fields.
#[derive(Debug, Deserialize)]
struct WebhookPayload {
    id: String,
    #[allow(dead_code)]
    checkout_reference: Option<String>,
    status: String,
    transaction_id: Option<String>,
    amount: Option<f64>,
}

/// Maps the gateway status vocabulary onto the internal tri-state.
/// Unknown statuses are treated as still pending.
fn map_status(status: &str) -> CheckoutStatus {
    match status {
        "PAID" => CheckoutStatus::Completed,
        "FAILED" | "CANCELLED" => CheckoutStatus::Failed,
        "PENDING" => CheckoutStatus::Pending,
        _ => CheckoutStatus::Pending,
    }
}

/// Parses a webhook body into an event. The caller must have verified the
/// signature over these exact bytes first.
pub fn parse_webhook(raw_body: &[u8]) -> Result<WebhookEvent, GatewayError> {
    let payload: WebhookPayload = serde_json::from_slice(raw_body)
        .map_err(|e| GatewayError::Response(format!("malformed webhook payload: {e}")))?;

    Ok(WebhookEvent {
        checkout_id: payload.id,
        status: map_status(&payload.status),
        transaction_id: payload.transaction_id,
        amount: payload.amount,
    })
}

/// Client for the SumUp checkout API.
pub struct SumUpClient {
    http: Client,
    api_url: String,
    api_key: String,
    merchant_code: String,
    pay_base_url: String,
    return_url: String,
}

impl SumUpClient {
    /// Creates a new client from configuration. `return_url` is where the
    /// gateway redirects the payer after checkout.
    pub fn new(config: &GatewayConfig, return_url: String) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(GATEWAY_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            merchant_code: config.merchant_code.clone(),
            pay_base_url: config.pay_base_url.clone(),
            return_url,
        }
    }

    async fn get_checkout(&self, checkout_id: &str) -> Result<CheckoutResponse, GatewayError> {
        let response = self
            .http
            .get(format!("{}/checkouts/{}", self.api_url, checkout_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, error = %body, "Gateway checkout lookup failed");
            return Err(GatewayError::Response(format!(
                "gateway returned {status}: {body}"
            )));
        }

        response
            .json::<CheckoutResponse>()
            .await
            .map_err(|e| GatewayError::Response(e.to_string()))
    }

    /// Issue a refund for a completed transaction. Requires refund
    /// permissions on the merchant account.
    pub async fn refund(&self, transaction_id: &str, amount: f64) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(format!("{}/me/refund/{}", self.api_url, transaction_id))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "amount": amount }))
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, error = %body, "Gateway refund failed");
            return Err(GatewayError::Response(format!(
                "gateway returned {status}: {body}"
            )));
        }

        info!(transaction_id = %transaction_id, "Refund created");
        Ok(())
    }
}

#[async_trait::async_trait]
impl PaymentGateway for SumUpClient {
    async fn create_checkout(
        &self,
        reference: &str,
        amount: f64,
        description: &str,
    ) -> Result<CheckoutSession, GatewayError> {
        let checkout_reference = format!("REG-{reference}");
        let body = CheckoutRequest {
            checkout_reference: &checkout_reference,
            amount,
            currency: "EUR",
            merchant_code: &self.merchant_code,
            description,
            return_url: &self.return_url,
        };

        let response = self
            .http
            .post(format!("{}/checkouts", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, error = %body, "Gateway checkout creation failed");
            return Err(GatewayError::Response(format!(
                "gateway returned {status}: {body}"
            )));
        }

        let checkout = response
            .json::<CheckoutResponse>()
            .await
            .map_err(|e| GatewayError::Response(e.to_string()))?;

        info!(checkout_id = %checkout.id, reference = %checkout_reference, "Checkout created");

        let checkout_url = format!("{}/{}", self.pay_base_url, checkout.id);
        Ok(CheckoutSession {
            checkout_id: checkout.id,
            checkout_url,
        })
    }

    async fn checkout_status(
        &self,
        checkout_id: &str,
    ) -> Result<CheckoutStatusInfo, GatewayError> {
        let checkout = self.get_checkout(checkout_id).await?;
        let status = map_status(checkout.status.as_deref().unwrap_or("PENDING"));
        let transaction_id = match status {
            CheckoutStatus::Completed => checkout.transaction_id.or(Some(checkout.id)),
            _ => None,
        };

        Ok(CheckoutStatusInfo {
            status,
            transaction_id,
        })
    }
}
