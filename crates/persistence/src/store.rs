//! Postgres implementation of the domain registration store.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{
    Payment, Registration, RegistrationDetails, RegistrationStatus, RegistrantInfo, User, Webinar,
};
use domain::services::{RegistrationStore, StoreError};

use crate::repositories::{
    PaymentRepository, RegistrationRepository, UserRepository, WebinarRepository,
};

/// `RegistrationStore` backed by the sqlx repositories.
#[derive(Clone)]
pub struct PgStore {
    users: UserRepository,
    webinars: WebinarRepository,
    registrations: RegistrationRepository,
    payments: PaymentRepository,
}

impl PgStore {
    /// Creates a store over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            webinars: WebinarRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool),
        }
    }
}

/// Translates sqlx errors into store errors, surfacing unique violations
/// (Postgres 23505) as conflicts.
fn map_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::Conflict(db_err.to_string());
        }
    }
    StoreError::Database(err.to_string())
}

#[async_trait::async_trait]
impl RegistrationStore for PgStore {
    async fn find_webinar(&self, id: Uuid) -> Result<Option<Webinar>, StoreError> {
        let entity = self.webinars.find_by_id(id).await.map_err(map_err)?;
        Ok(entity.map(Into::into))
    }

    async fn count_confirmed_registrations(&self, webinar_id: Uuid) -> Result<i64, StoreError> {
        self.webinars
            .count_confirmed_registrations(webinar_id)
            .await
            .map_err(map_err)
    }

    async fn upsert_user_by_email(&self, info: &RegistrantInfo) -> Result<User, StoreError> {
        let entity = self
            .users
            .upsert_by_email(&info.email, &info.name, info.company.as_deref())
            .await
            .map_err(map_err)?;
        Ok(entity.into())
    }

    async fn has_active_registration(
        &self,
        user_id: Uuid,
        webinar_id: Uuid,
    ) -> Result<bool, StoreError> {
        self.registrations
            .has_active_registration(user_id, webinar_id)
            .await
            .map_err(map_err)
    }

    async fn create_registration(
        &self,
        user_id: Uuid,
        webinar_id: Uuid,
    ) -> Result<Registration, StoreError> {
        let entity = self
            .registrations
            .create(user_id, webinar_id)
            .await
            .map_err(map_err)?;
        Ok(entity.into())
    }

    async fn find_registration(&self, id: Uuid) -> Result<Option<Registration>, StoreError> {
        let entity = self.registrations.find_by_id(id).await.map_err(map_err)?;
        Ok(entity.map(Into::into))
    }

    async fn find_registration_details(
        &self,
        id: Uuid,
    ) -> Result<Option<RegistrationDetails>, StoreError> {
        let entity = self.registrations.find_details(id).await.map_err(map_err)?;
        Ok(entity.map(Into::into))
    }

    async fn update_registration_status(
        &self,
        id: Uuid,
        status: RegistrationStatus,
    ) -> Result<(), StoreError> {
        self.registrations
            .update_status(id, status.into())
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn set_meeting_info(
        &self,
        id: Uuid,
        meet_link: &str,
        calendar_event_id: &str,
    ) -> Result<(), StoreError> {
        self.registrations
            .set_meeting_info(id, meet_link, calendar_event_id)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn link_payment(
        &self,
        registration_id: Uuid,
        payment_id: Uuid,
    ) -> Result<(), StoreError> {
        self.registrations
            .link_payment(registration_id, payment_id)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn create_payment(
        &self,
        registration_id: Uuid,
        amount: f64,
        currency: &str,
    ) -> Result<Payment, StoreError> {
        let entity = self
            .payments
            .create(registration_id, amount, currency)
            .await
            .map_err(map_err)?;
        Ok(entity.into())
    }

    async fn set_payment_checkout(
        &self,
        payment_id: Uuid,
        checkout_id: &str,
    ) -> Result<(), StoreError> {
        self.payments
            .set_checkout_id(payment_id, checkout_id)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>, StoreError> {
        let entity = self.payments.find_by_id(id).await.map_err(map_err)?;
        Ok(entity.map(Into::into))
    }

    async fn find_payment_by_checkout(
        &self,
        checkout_id: &str,
    ) -> Result<Option<Payment>, StoreError> {
        let entity = self
            .payments
            .find_by_checkout_id(checkout_id)
            .await
            .map_err(map_err)?;
        Ok(entity.map(Into::into))
    }

    async fn find_payment_by_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Payment>, StoreError> {
        let entity = self
            .payments
            .find_by_registration_id(registration_id)
            .await
            .map_err(map_err)?;
        Ok(entity.map(Into::into))
    }

    async fn mark_payment_completed(
        &self,
        id: Uuid,
        transaction_id: Option<&str>,
    ) -> Result<(), StoreError> {
        self.payments
            .mark_completed(id, transaction_id)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn mark_payment_failed(&self, id: Uuid) -> Result<(), StoreError> {
        self.payments.mark_failed(id).await.map_err(map_err)?;
        Ok(())
    }

    async fn count_completed_payments_in_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, StoreError> {
        self.payments
            .count_completed_in_month(year, month)
            .await
            .map_err(map_err)
    }

    async fn set_invoice_number(
        &self,
        payment_id: Uuid,
        invoice_number: &str,
    ) -> Result<(), StoreError> {
        self.payments
            .set_invoice_number(payment_id, invoice_number)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn registrations_needing_reminder(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RegistrationDetails>, StoreError> {
        let entities = self
            .registrations
            .needing_reminder(window_start, window_end)
            .await
            .map_err(map_err)?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn mark_reminder_sent(&self, registration_id: Uuid) -> Result<(), StoreError> {
        self.registrations
            .mark_reminder_sent(registration_id)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}
