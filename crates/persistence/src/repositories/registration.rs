//! Registration repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{RegistrationDetailsEntity, RegistrationEntity, RegistrationStatusDb};
use crate::metrics::QueryTimer;

/// Column list for registration details joined with user and webinar rows.
const DETAILS_COLUMNS: &str = r#"
    r.id, r.user_id, r.webinar_id, r.payment_id, r.status, r.meet_link,
    r.calendar_event_id, r.reminder_sent, r.created_at, r.updated_at,
    u.email AS user_email, u.name AS user_name, u.company AS user_company,
    u.created_at AS user_created_at, u.updated_at AS user_updated_at,
    w.title AS webinar_title, w.description AS webinar_description,
    w.start_date AS webinar_start_date, w.end_date AS webinar_end_date,
    w.price AS webinar_price, w.max_participants AS webinar_max_participants,
    w.status AS webinar_status, w.created_at AS webinar_created_at,
    w.updated_at AS webinar_updated_at
"#;

/// Repository for registration-related database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    /// Creates a new RegistrationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending registration.
    ///
    /// The partial unique index on (user_id, webinar_id) for non-cancelled
    /// rows makes a duplicate surface as a unique violation.
    pub async fn create(
        &self,
        user_id: Uuid,
        webinar_id: Uuid,
    ) -> Result<RegistrationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_registration");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            INSERT INTO registrations (user_id, webinar_id, status)
            VALUES ($1, $2, 'pending')
            RETURNING id, user_id, webinar_id, payment_id, status, meet_link, calendar_event_id, reminder_sent, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(webinar_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a registration by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_by_id");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            SELECT id, user_id, webinar_id, payment_id, status, meet_link, calendar_event_id, reminder_sent, created_at, updated_at
            FROM registrations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a registration with its user and webinar.
    pub async fn find_details(
        &self,
        id: Uuid,
    ) -> Result<Option<RegistrationDetailsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_details");
        let query = format!(
            r#"
            SELECT {DETAILS_COLUMNS}
            FROM registrations r
            JOIN users u ON r.user_id = u.id
            JOIN webinars w ON r.webinar_id = w.id
            WHERE r.id = $1
            "#
        );
        let result = sqlx::query_as::<_, RegistrationDetailsEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Whether the user has a non-cancelled registration for the webinar.
    pub async fn has_active_registration(
        &self,
        user_id: Uuid,
        webinar_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("has_active_registration");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM registrations
                WHERE user_id = $1 AND webinar_id = $2 AND status <> 'cancelled'
            )
            "#,
        )
        .bind(user_id)
        .bind(webinar_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Registrations for a webinar, newest first, with details.
    pub async fn find_by_webinar(
        &self,
        webinar_id: Uuid,
    ) -> Result<Vec<RegistrationDetailsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registrations_by_webinar");
        let query = format!(
            r#"
            SELECT {DETAILS_COLUMNS}
            FROM registrations r
            JOIN users u ON r.user_id = u.id
            JOIN webinars w ON r.webinar_id = w.id
            WHERE r.webinar_id = $1
            ORDER BY r.created_at DESC
            "#
        );
        let result = sqlx::query_as::<_, RegistrationDetailsEntity>(&query)
            .bind(webinar_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Update the status of a registration.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: RegistrationStatusDb,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("update_registration_status");
        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Link a payment to a registration.
    pub async fn link_payment(&self, id: Uuid, payment_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("link_registration_payment");
        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET payment_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payment_id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Persist the meeting link and calendar event id after provisioning.
    pub async fn set_meeting_info(
        &self,
        id: Uuid,
        meet_link: &str,
        calendar_event_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("set_registration_meeting_info");
        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET meet_link = $2, calendar_event_id = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(meet_link)
        .bind(calendar_event_id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Mark the day-before reminder as sent.
    pub async fn mark_reminder_sent(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("mark_reminder_sent");
        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET reminder_sent = TRUE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Confirmed, not-yet-reminded registrations whose webinar starts in
    /// `[window_start, window_end)`.
    pub async fn needing_reminder(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RegistrationDetailsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("registrations_needing_reminder");
        let query = format!(
            r#"
            SELECT {DETAILS_COLUMNS}
            FROM registrations r
            JOIN users u ON r.user_id = u.id
            JOIN webinars w ON r.webinar_id = w.id
            WHERE r.status = 'confirmed'
              AND r.reminder_sent = FALSE
              AND w.start_date >= $1
              AND w.start_date < $2
            "#
        );
        let result = sqlx::query_as::<_, RegistrationDetailsEntity>(&query)
            .bind(window_start)
            .bind(window_end)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }
}
