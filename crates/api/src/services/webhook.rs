//! Payment webhook processing.
//!
//! Verifies inbound gateway notifications and drives the confirmation
//! routine exactly once per payment. The gateway retries on non-2xx
//! responses, so once a notification is authenticated and its payment
//! state durably recorded, downstream confirmation failures must not leak
//! into the acknowledgement.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use domain::models::PaymentStatus;
use domain::services::{CheckoutStatus, RegistrationStore, StoreError};

use crate::error::ApiError;
use crate::services::registration::{best_effort, RegistrationService};
use crate::services::sumup::parse_webhook;

/// Errors from webhook processing. Everything here yields a non-2xx
/// response; anything handled per the acknowledgement contract returns Ok.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Malformed webhook payload: {0}")]
    Malformed(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        let message = err.to_string();
        match err {
            WebhookError::InvalidSignature => ApiError::Unauthorized(message),
            WebhookError::Malformed(_) => ApiError::validation(message),
            WebhookError::Store(e) => e.into(),
        }
    }
}

/// Handles inbound payment notifications from the gateway.
pub struct PaymentWebhookService {
    store: Arc<dyn RegistrationStore>,
    registrations: Arc<RegistrationService>,
    webhook_secret: String,
}

impl PaymentWebhookService {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        registrations: Arc<RegistrationService>,
        webhook_secret: String,
    ) -> Self {
        Self {
            store,
            registrations,
            webhook_secret,
        }
    }

    /// Process one webhook delivery.
    ///
    /// The signature is an HMAC over the raw body bytes, so `raw_body` must
    /// be the request body exactly as received. Returning Ok means the
    /// gateway gets a success acknowledgement.
    pub async fn handle(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<(), WebhookError> {
        let signature = signature.ok_or(WebhookError::InvalidSignature)?;
        if !shared::crypto::verify_signature(&self.webhook_secret, raw_body, signature) {
            return Err(WebhookError::InvalidSignature);
        }

        let event = parse_webhook(raw_body).map_err(|e| WebhookError::Malformed(e.to_string()))?;

        info!(
            checkout_id = %event.checkout_id,
            status = ?event.status,
            "Payment webhook received"
        );

        let Some(payment) = self
            .store
            .find_payment_by_checkout(&event.checkout_id)
            .await?
        else {
            // Not a payment we created. Acknowledge anyway so the gateway
            // does not retry forever.
            info!(checkout_id = %event.checkout_id, "No payment for checkout, acknowledging");
            return Ok(());
        };

        // Idempotency guard: duplicate or replayed deliveries for a payment
        // that already completed are acknowledged without reprocessing.
        if payment.status == PaymentStatus::Completed {
            info!(payment_id = %payment.id, "Payment already processed");
            return Ok(());
        }

        match event.status {
            CheckoutStatus::Completed => {
                self.store
                    .mark_payment_completed(payment.id, event.transaction_id.as_deref())
                    .await?;

                info!(payment_id = %payment.id, "Payment completed");

                // The payment status is already durably committed; a failure
                // in calendar/invoice/email must not fail the webhook, or the
                // gateway would retry a payment update that already succeeded.
                best_effort(
                    "confirm_after_payment",
                    self.registrations.confirm(payment.registration_id),
                )
                .await;
            }
            CheckoutStatus::Failed => {
                self.store.mark_payment_failed(payment.id).await?;
                info!(payment_id = %payment.id, "Payment failed");
            }
            CheckoutStatus::Pending => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::registration::RegistrationOutcome;
    use crate::services::testing::{
        registrant, test_company, test_webinar, InMemoryStore, MockGateway, MockMailer,
        MockMeetingProvider,
    };
    use domain::models::registration::CreateRegistrationRequest;
    use domain::models::{Payment, Registration, RegistrationStatus};
    use shared::crypto::sign_payload;

    const SECRET: &str = "test-webhook-secret";

    struct Harness {
        store: Arc<InMemoryStore>,
        meetings: Arc<MockMeetingProvider>,
        mailer: Arc<MockMailer>,
        webhook: PaymentWebhookService,
        registration: Registration,
        payment: Payment,
    }

    async fn paid_registration_harness(meetings: Arc<MockMeetingProvider>) -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let gateway = Arc::new(MockGateway::new());
        let mailer = Arc::new(MockMailer::new());

        let webinar = store.insert_webinar(test_webinar(49.0, 100)).await;
        let registrations = Arc::new(RegistrationService::new(
            store.clone(),
            gateway,
            meetings.clone(),
            mailer.clone(),
            test_company(),
        ));

        let outcome = registrations
            .create(CreateRegistrationRequest {
                webinar_id: webinar.id,
                user: registrant("jane@example.com", "Jane Doe"),
            })
            .await
            .unwrap();

        let (registration, payment) = match outcome {
            RegistrationOutcome::PendingPayment {
                registration,
                payment,
                ..
            } => (registration, payment),
            other => panic!("Expected PendingPayment, got {other:?}"),
        };

        let webhook = PaymentWebhookService::new(
            store.clone(),
            registrations,
            SECRET.to_string(),
        );

        Harness {
            store,
            meetings,
            mailer,
            webhook,
            registration,
            payment,
        }
    }

    async fn checkout_id(harness: &Harness) -> String {
        harness
            .store
            .payment_by_id(harness.payment.id)
            .await
            .unwrap()
            .checkout_id
            .unwrap()
    }

    fn webhook_body(checkout_id: &str, status: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": checkout_id,
            "checkout_reference": "REG-test",
            "status": status,
            "transaction_id": "txn-789",
            "amount": 49.0
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_invalid_signature_changes_nothing() {
        let harness = paid_registration_harness(Arc::new(MockMeetingProvider::new())).await;
        let body = webhook_body(&checkout_id(&harness).await, "PAID");

        let result = harness.webhook.handle(&body, Some("deadbeef")).await;
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));

        let payment = harness.store.payment_by_id(harness.payment.id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(harness.meetings.create_calls(), 0);
        assert_eq!(harness.mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_signature_rejected() {
        let harness = paid_registration_harness(Arc::new(MockMeetingProvider::new())).await;
        let body = webhook_body(&checkout_id(&harness).await, "PAID");

        let result = harness.webhook.handle(&body, None).await;
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[tokio::test]
    async fn test_unknown_checkout_acknowledged_without_changes() {
        let harness = paid_registration_harness(Arc::new(MockMeetingProvider::new())).await;
        let body = webhook_body("chk-unknown", "PAID");
        let signature = sign_payload(SECRET, &body);

        harness.webhook.handle(&body, Some(&signature)).await.unwrap();

        let payment = harness.store.payment_by_id(harness.payment.id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(harness.meetings.create_calls(), 0);
        assert_eq!(harness.mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_completed_webhook_confirms_registration() {
        let harness = paid_registration_harness(Arc::new(MockMeetingProvider::new())).await;
        let body = webhook_body(&checkout_id(&harness).await, "PAID");
        let signature = sign_payload(SECRET, &body);

        harness.webhook.handle(&body, Some(&signature)).await.unwrap();

        let payment = harness.store.payment_by_id(harness.payment.id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.transaction_id.as_deref(), Some("txn-789"));
        assert!(payment.payment_date.is_some());
        assert!(payment
            .invoice_number
            .as_deref()
            .is_some_and(|n| n.starts_with("INV-")));

        let registration = harness
            .store
            .find_registration(harness.registration.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(registration.status, RegistrationStatus::Confirmed);
        assert!(registration.meet_link.is_some());

        assert_eq!(harness.meetings.create_calls(), 1);
        assert_eq!(harness.mailer.sent_count(), 1);
        let email = harness.mailer.last_message().unwrap();
        assert_eq!(email.to, "jane@example.com");
        assert!(email.attachment.is_some());
    }

    #[tokio::test]
    async fn test_replayed_webhook_is_noop() {
        let harness = paid_registration_harness(Arc::new(MockMeetingProvider::new())).await;
        let body = webhook_body(&checkout_id(&harness).await, "PAID");
        let signature = sign_payload(SECRET, &body);

        harness.webhook.handle(&body, Some(&signature)).await.unwrap();
        harness.webhook.handle(&body, Some(&signature)).await.unwrap();

        // No duplicate meeting event or email on replay.
        assert_eq!(harness.meetings.create_calls(), 1);
        assert_eq!(harness.mailer.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_webhook_marks_payment_failed() {
        let harness = paid_registration_harness(Arc::new(MockMeetingProvider::new())).await;
        let body = webhook_body(&checkout_id(&harness).await, "FAILED");
        let signature = sign_payload(SECRET, &body);

        harness.webhook.handle(&body, Some(&signature)).await.unwrap();

        let payment = harness.store.payment_by_id(harness.payment.id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Failed);

        let registration = harness
            .store
            .find_registration(harness.registration.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(registration.status, RegistrationStatus::Pending);
        assert_eq!(harness.meetings.create_calls(), 0);
        assert_eq!(harness.mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_pending_webhook_leaves_payment_pending() {
        let harness = paid_registration_harness(Arc::new(MockMeetingProvider::new())).await;
        let body = webhook_body(&checkout_id(&harness).await, "PENDING");
        let signature = sign_payload(SECRET, &body);

        harness.webhook.handle(&body, Some(&signature)).await.unwrap();

        let payment = harness.store.payment_by_id(harness.payment.id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_confirmation_failure_still_acknowledges() {
        let harness =
            paid_registration_harness(Arc::new(MockMeetingProvider::failing_create())).await;
        let body = webhook_body(&checkout_id(&harness).await, "PAID");
        let signature = sign_payload(SECRET, &body);

        // Confirmation fails (calendar outage) but the webhook succeeds: the
        // payment update is already committed.
        harness.webhook.handle(&body, Some(&signature)).await.unwrap();

        let payment = harness.store.payment_by_id(harness.payment.id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(harness.mailer.sent_count(), 0);

        let registration = harness
            .store
            .find_registration(harness.registration.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(registration.status, RegistrationStatus::Pending);
    }

    #[tokio::test]
    async fn test_cancelled_status_maps_to_failed() {
        let harness = paid_registration_harness(Arc::new(MockMeetingProvider::new())).await;
        let body = webhook_body(&checkout_id(&harness).await, "CANCELLED");
        let signature = sign_payload(SECRET, &body);

        harness.webhook.handle(&body, Some(&signature)).await.unwrap();

        let payment = harness.store.payment_by_id(harness.payment.id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Failed);
    }
}
