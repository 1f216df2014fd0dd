//! Registration store abstraction.
//!
//! The persistence crate provides the Postgres implementation; workflow
//! tests use an in-memory one.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Payment, Registration, RegistrationDetails, RegistrationStatus, RegistrantInfo, User, Webinar,
};

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated (duplicate registration).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Persistence operations the registration workflow, webhook handler and
/// reminder sweep need. Each call commits independently; no transaction
/// spans the multi-step confirmation routine.
#[async_trait::async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn find_webinar(&self, id: Uuid) -> Result<Option<Webinar>, StoreError>;

    /// Count of confirmed registrations, used for the capacity check.
    async fn count_confirmed_registrations(&self, webinar_id: Uuid) -> Result<i64, StoreError>;

    /// Finds a user by email (case-insensitive) and creates or updates it.
    /// Name and company are overwritten; email is immutable.
    async fn upsert_user_by_email(&self, info: &RegistrantInfo) -> Result<User, StoreError>;

    /// Whether the user already holds a non-cancelled registration for the
    /// webinar.
    async fn has_active_registration(
        &self,
        user_id: Uuid,
        webinar_id: Uuid,
    ) -> Result<bool, StoreError>;

    /// Inserts a pending registration. Returns `StoreError::Conflict` when
    /// a non-cancelled registration already exists for the pair.
    async fn create_registration(
        &self,
        user_id: Uuid,
        webinar_id: Uuid,
    ) -> Result<Registration, StoreError>;

    async fn find_registration(&self, id: Uuid) -> Result<Option<Registration>, StoreError>;

    /// Loads a registration joined with its user and webinar.
    async fn find_registration_details(
        &self,
        id: Uuid,
    ) -> Result<Option<RegistrationDetails>, StoreError>;

    async fn update_registration_status(
        &self,
        id: Uuid,
        status: RegistrationStatus,
    ) -> Result<(), StoreError>;

    async fn set_meeting_info(
        &self,
        id: Uuid,
        meet_link: &str,
        calendar_event_id: &str,
    ) -> Result<(), StoreError>;

    async fn link_payment(&self, registration_id: Uuid, payment_id: Uuid)
        -> Result<(), StoreError>;

    /// Inserts a pending payment for a registration.
    async fn create_payment(
        &self,
        registration_id: Uuid,
        amount: f64,
        currency: &str,
    ) -> Result<Payment, StoreError>;

    async fn set_payment_checkout(
        &self,
        payment_id: Uuid,
        checkout_id: &str,
    ) -> Result<(), StoreError>;

    async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>, StoreError>;

    async fn find_payment_by_checkout(
        &self,
        checkout_id: &str,
    ) -> Result<Option<Payment>, StoreError>;

    async fn find_payment_by_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Payment>, StoreError>;

    /// Marks a payment completed, recording the transaction id and setting
    /// `payment_date` to now.
    async fn mark_payment_completed(
        &self,
        id: Uuid,
        transaction_id: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn mark_payment_failed(&self, id: Uuid) -> Result<(), StoreError>;

    /// Count of completed payments whose payment_date falls in the given
    /// calendar month. Feeds invoice numbering.
    async fn count_completed_payments_in_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, StoreError>;

    async fn set_invoice_number(
        &self,
        payment_id: Uuid,
        invoice_number: &str,
    ) -> Result<(), StoreError>;

    /// Confirmed, not-yet-reminded registrations whose webinar starts in
    /// `[window_start, window_end)`.
    async fn registrations_needing_reminder(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RegistrationDetails>, StoreError>;

    /// Flips `reminder_sent` to true. Never reverts.
    async fn mark_reminder_sent(&self, registration_id: Uuid) -> Result<(), StoreError>;
}
