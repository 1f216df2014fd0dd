//! Payment gateway abstraction.

use thiserror::Error;

/// A gateway-hosted checkout session for one payment attempt.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub checkout_id: String,
    /// URL the registrant is redirected to in order to pay.
    pub checkout_url: String,
}

/// Internal tri-state a gateway checkout status maps to. Provider-specific
/// status strings never leave the client wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStatus {
    Pending,
    Completed,
    Failed,
}

/// Status of a checkout as reported by the gateway.
#[derive(Debug, Clone)]
pub struct CheckoutStatusInfo {
    pub status: CheckoutStatus,
    pub transaction_id: Option<String>,
}

/// Errors from the payment gateway client.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Request(String),

    #[error("unexpected gateway response: {0}")]
    Response(String),
}

/// Outbound payment gateway operations the workflow needs.
#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a checkout session for an amount, keyed by an opaque
    /// reference (the registration id).
    async fn create_checkout(
        &self,
        reference: &str,
        amount: f64,
        description: &str,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Queries the current status of a checkout.
    async fn checkout_status(&self, checkout_id: &str)
        -> Result<CheckoutStatusInfo, GatewayError>;
}
