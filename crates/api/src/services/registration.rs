//! Registration workflow: creation, payment-gated confirmation, and
//! cancellation.
//!
//! The confirmation routine is shared by the free-webinar path (invoked
//! synchronously) and the payment webhook (invoked after the payment is
//! durably marked completed). Each step commits independently; re-invoking
//! the routine is the recovery path after a partial failure, at the cost of
//! a possible orphaned meeting event.

use chrono::{Datelike, Utc};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use domain::models::{
    format_invoice_number, PaymentStatus, Registration, RegistrationStatus, Webinar, WebinarStatus,
};
use domain::models::payment::Payment;
use domain::models::registration::CreateRegistrationRequest;
use domain::services::{
    EmailAttachment, GatewayError, MailError, MeetingError, MeetingProvider, MeetingRequest,
    Mailer, PaymentGateway, RegistrationStore, StoreError,
};

use crate::config::CompanyConfig;
use crate::error::ApiError;
use crate::services::email::confirmation_email;
use crate::services::invoice::{render_invoice, InvoiceData};

/// Errors from the registration workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Webinar not found")]
    WebinarNotFound,

    #[error("Registration not found")]
    RegistrationNotFound,

    #[error("This webinar is no longer open for registration")]
    WebinarNotActive,

    #[error("This webinar is full")]
    WebinarFull,

    #[error("You are already registered for this webinar")]
    AlreadyRegistered,

    #[error("This registration is already cancelled")]
    AlreadyCancelled,

    #[error("You are not allowed to modify this registration")]
    NotOwner,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("meeting provider error: {0}")]
    Meeting(#[from] MeetingError),

    #[error("notification error: {0}")]
    Mail(#[from] MailError),

    #[error("invoice rendering error: {0}")]
    Invoice(String),
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::WebinarNotFound | WorkflowError::RegistrationNotFound => {
                ApiError::NotFound(message)
            }
            WorkflowError::WebinarNotActive | WorkflowError::AlreadyCancelled => {
                ApiError::validation(message)
            }
            WorkflowError::WebinarFull => ApiError::Capacity(message),
            WorkflowError::AlreadyRegistered => ApiError::Conflict(message),
            WorkflowError::NotOwner => ApiError::Forbidden(message),
            WorkflowError::Store(e) => e.into(),
            WorkflowError::Gateway(e) => e.into(),
            WorkflowError::Meeting(e) => e.into(),
            WorkflowError::Mail(e) => e.into(),
            WorkflowError::Invoice(msg) => ApiError::Internal(msg),
        }
    }
}

/// Result of creating a registration.
#[derive(Debug)]
pub enum RegistrationOutcome {
    /// Free webinar: confirmed synchronously.
    Confirmed {
        registration: Registration,
        webinar: Webinar,
    },
    /// Priced webinar: confirmation waits for the payment webhook.
    PendingPayment {
        registration: Registration,
        payment: Payment,
        checkout_url: String,
        webinar: Webinar,
    },
}

/// Runs an operation under the log-and-continue policy: a failure is logged
/// and swallowed instead of propagating. Used where a side effect must not
/// block the surrounding flow (event deletion on cancel, confirmation after
/// a webhook).
pub async fn best_effort<T, E, F>(op: &'static str, fut: F) -> Option<T>
where
    E: std::fmt::Display,
    F: Future<Output = Result<T, E>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(op = op, error = %e, "Best-effort operation failed");
            None
        }
    }
}

/// The registration workflow over injected collaborators.
pub struct RegistrationService {
    store: Arc<dyn RegistrationStore>,
    gateway: Arc<dyn PaymentGateway>,
    meetings: Arc<dyn MeetingProvider>,
    mailer: Arc<dyn Mailer>,
    company: CompanyConfig,
}

impl RegistrationService {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        gateway: Arc<dyn PaymentGateway>,
        meetings: Arc<dyn MeetingProvider>,
        mailer: Arc<dyn Mailer>,
        company: CompanyConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            meetings,
            mailer,
            company,
        }
    }

    /// Create a registration for a webinar.
    ///
    /// Preconditions are checked in order, each failing with its own error:
    /// webinar exists, webinar active, capacity left, no duplicate
    /// registration. A priced webinar gets a pending payment and a checkout
    /// session; a free one is confirmed before returning.
    pub async fn create(
        &self,
        request: CreateRegistrationRequest,
    ) -> Result<RegistrationOutcome, WorkflowError> {
        let webinar = self
            .store
            .find_webinar(request.webinar_id)
            .await?
            .ok_or(WorkflowError::WebinarNotFound)?;

        if webinar.status != WebinarStatus::Active {
            return Err(WorkflowError::WebinarNotActive);
        }

        let confirmed = self
            .store
            .count_confirmed_registrations(webinar.id)
            .await?;
        if confirmed >= webinar.max_participants as i64 {
            return Err(WorkflowError::WebinarFull);
        }

        let user = self.store.upsert_user_by_email(&request.user).await?;

        if self
            .store
            .has_active_registration(user.id, webinar.id)
            .await?
        {
            return Err(WorkflowError::AlreadyRegistered);
        }

        let registration = self
            .store
            .create_registration(user.id, webinar.id)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => WorkflowError::AlreadyRegistered,
                other => WorkflowError::Store(other),
            })?;

        info!(
            registration_id = %registration.id,
            webinar_id = %webinar.id,
            user_id = %user.id,
            price = webinar.price,
            "Registration created"
        );

        if webinar.is_paid() {
            let payment = self
                .store
                .create_payment(registration.id, webinar.price, "EUR")
                .await?;

            let session = self
                .gateway
                .create_checkout(
                    &registration.id.to_string(),
                    webinar.price,
                    &format!("Webinar: {}", webinar.title),
                )
                .await?;

            self.store
                .set_payment_checkout(payment.id, &session.checkout_id)
                .await?;
            self.store.link_payment(registration.id, payment.id).await?;

            info!(
                registration_id = %registration.id,
                payment_id = %payment.id,
                checkout_id = %session.checkout_id,
                "Checkout created, awaiting payment"
            );

            Ok(RegistrationOutcome::PendingPayment {
                registration,
                payment,
                checkout_url: session.checkout_url,
                webinar,
            })
        } else {
            self.confirm(registration.id).await?;

            let registration = self
                .store
                .find_registration(registration.id)
                .await?
                .ok_or(WorkflowError::RegistrationNotFound)?;

            Ok(RegistrationOutcome::Confirmed {
                registration,
                webinar,
            })
        }
    }

    /// Confirm a registration: provision the meeting, mark confirmed,
    /// generate the invoice for a completed payment, and notify the user.
    ///
    /// Idempotent with respect to registration state, but each invocation
    /// creates a fresh meeting event.
    pub async fn confirm(&self, registration_id: Uuid) -> Result<(), WorkflowError> {
        let details = self
            .store
            .find_registration_details(registration_id)
            .await?
            .ok_or(WorkflowError::RegistrationNotFound)?;

        let user = details.user;
        let webinar = details.webinar;

        let event = self
            .meetings
            .create_event(&MeetingRequest {
                title: webinar.title.clone(),
                description: webinar.description.clone(),
                start_date: webinar.start_date,
                end_date: webinar.end_date,
                attendee_email: user.email.clone(),
            })
            .await?;

        self.store
            .set_meeting_info(registration_id, &event.join_link, &event.event_id)
            .await?;

        self.store
            .update_registration_status(registration_id, RegistrationStatus::Confirmed)
            .await?;

        info!(
            registration_id = %registration_id,
            event_id = %event.event_id,
            "Registration confirmed"
        );

        let mut attachment: Option<EmailAttachment> = None;
        if let Some(payment) = self
            .store
            .find_payment_by_registration(registration_id)
            .await?
        {
            if payment.status == PaymentStatus::Completed {
                let now = Utc::now();
                // Read-count-then-format: two confirmations in the same month
                // can race to the same sequence number.
                let sequence = self
                    .store
                    .count_completed_payments_in_month(now.year(), now.month())
                    .await?
                    + 1;
                let invoice_number = format_invoice_number(now.year(), now.month(), sequence);

                let pdf = render_invoice(
                    &InvoiceData {
                        invoice_number: invoice_number.clone(),
                        invoice_date: payment.payment_date.unwrap_or(now),
                        customer_name: user.name.clone(),
                        customer_email: user.email.clone(),
                        customer_company: user.company.clone(),
                        webinar_title: webinar.title.clone(),
                        webinar_date: webinar.start_date,
                        amount: payment.amount,
                        payment_method: "SumUp".to_string(),
                    },
                    &self.company,
                )
                .map_err(|e| WorkflowError::Invoice(e.to_string()))?;

                self.store
                    .set_invoice_number(payment.id, &invoice_number)
                    .await?;

                info!(
                    payment_id = %payment.id,
                    invoice_number = %invoice_number,
                    "Invoice generated"
                );

                attachment = Some(EmailAttachment {
                    filename: "invoice.pdf".to_string(),
                    content: pdf,
                    mime_type: "application/pdf".to_string(),
                });
            }
        }

        self.mailer
            .send(confirmation_email(
                &self.company.name,
                &user.email,
                &user.name,
                &webinar.title,
                webinar.start_date,
                &event.join_link,
                attachment,
            ))
            .await?;

        Ok(())
    }

    /// Cancel a registration on behalf of its owner. The associated meeting
    /// event is deleted best-effort; cancellation succeeds regardless.
    pub async fn cancel(
        &self,
        registration_id: Uuid,
        requester_user_id: Uuid,
    ) -> Result<(), WorkflowError> {
        let registration = self
            .store
            .find_registration(registration_id)
            .await?
            .ok_or(WorkflowError::RegistrationNotFound)?;

        if registration.user_id != requester_user_id {
            return Err(WorkflowError::NotOwner);
        }

        if registration.status == RegistrationStatus::Cancelled {
            return Err(WorkflowError::AlreadyCancelled);
        }

        self.store
            .update_registration_status(registration_id, RegistrationStatus::Cancelled)
            .await?;

        info!(registration_id = %registration_id, "Registration cancelled");

        if let Some(event_id) = &registration.calendar_event_id {
            best_effort("delete_meeting_event", self.meetings.delete_event(event_id)).await;
        }

        Ok(())
    }
}
