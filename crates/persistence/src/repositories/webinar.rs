//! Webinar repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{WebinarEntity, WebinarStatusDb};
use crate::metrics::QueryTimer;

/// Filters for listing webinars.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebinarListFilter {
    pub status: Option<WebinarStatusDb>,
    /// Only webinars whose start_date is in the future.
    pub upcoming: bool,
}

/// Repository for webinar-related database operations.
#[derive(Clone)]
pub struct WebinarRepository {
    pool: PgPool,
}

impl WebinarRepository {
    /// Creates a new WebinarRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new webinar with status `active`.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        title: &str,
        description: Option<&str>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        price: f64,
        max_participants: i32,
    ) -> Result<WebinarEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_webinar");
        let result = sqlx::query_as::<_, WebinarEntity>(
            r#"
            INSERT INTO webinars (title, description, start_date, end_date, price, max_participants, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'active')
            RETURNING id, title, description, start_date, end_date, price, max_participants, status, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(start_date)
        .bind(end_date)
        .bind(price)
        .bind(max_participants)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a webinar by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<WebinarEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_webinar_by_id");
        let result = sqlx::query_as::<_, WebinarEntity>(
            r#"
            SELECT id, title, description, start_date, end_date, price, max_participants, status, created_at, updated_at
            FROM webinars
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List webinars with optional filters, ordered by start date.
    pub async fn list(
        &self,
        filter: WebinarListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WebinarEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_webinars");
        let result = sqlx::query_as::<_, WebinarEntity>(
            r#"
            SELECT id, title, description, start_date, end_date, price, max_participants, status, created_at, updated_at
            FROM webinars
            WHERE ($1::webinar_status IS NULL OR status = $1)
              AND (NOT $2 OR start_date >= NOW())
            ORDER BY start_date ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.status)
        .bind(filter.upcoming)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count webinars matching the filter.
    pub async fn count(&self, filter: WebinarListFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_webinars");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM webinars
            WHERE ($1::webinar_status IS NULL OR status = $1)
              AND (NOT $2 OR start_date >= NOW())
            "#,
        )
        .bind(filter.status)
        .bind(filter.upcoming)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update a webinar. Absent fields keep their stored values.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        price: Option<f64>,
        max_participants: Option<i32>,
        status: Option<WebinarStatusDb>,
    ) -> Result<WebinarEntity, sqlx::Error> {
        let timer = QueryTimer::new("update_webinar");
        let result = sqlx::query_as::<_, WebinarEntity>(
            r#"
            UPDATE webinars
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                start_date = COALESCE($4, start_date),
                end_date = COALESCE($5, end_date),
                price = COALESCE($6, price),
                max_participants = COALESCE($7, max_participants),
                status = COALESCE($8, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, start_date, end_date, price, max_participants, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(start_date)
        .bind(end_date)
        .bind(price)
        .bind(max_participants)
        .bind(status)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a webinar.
    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_webinar");
        let result = sqlx::query(
            r#"
            DELETE FROM webinars
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Count confirmed registrations for a webinar (capacity check).
    pub async fn count_confirmed_registrations(&self, id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_confirmed_registrations");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM registrations
            WHERE webinar_id = $1 AND status = 'confirmed'
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
