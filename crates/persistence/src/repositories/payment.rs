//! Payment repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{PaymentEntity, PaymentStatusDb};
use crate::metrics::QueryTimer;

const PAYMENT_COLUMNS: &str = "id, registration_id, checkout_id, transaction_id, amount, currency, status, invoice_number, payment_date, created_at, updated_at";

/// Repository for payment-related database operations.
#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending payment for a registration.
    pub async fn create(
        &self,
        registration_id: Uuid,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_payment");
        let query = format!(
            r#"
            INSERT INTO payments (registration_id, amount, currency, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING {PAYMENT_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, PaymentEntity>(&query)
            .bind(registration_id)
            .bind(amount)
            .bind(currency)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find a payment by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_payment_by_id");
        let query = format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE id = $1
            "#
        );
        let result = sqlx::query_as::<_, PaymentEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find a payment by its gateway checkout id.
    pub async fn find_by_checkout_id(
        &self,
        checkout_id: &str,
    ) -> Result<Option<PaymentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_payment_by_checkout");
        let query = format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE checkout_id = $1
            "#
        );
        let result = sqlx::query_as::<_, PaymentEntity>(&query)
            .bind(checkout_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find the payment belonging to a registration.
    pub async fn find_by_registration_id(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<PaymentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_payment_by_registration");
        let query = format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE registration_id = $1
            "#
        );
        let result = sqlx::query_as::<_, PaymentEntity>(&query)
            .bind(registration_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Record the gateway checkout id on a payment.
    pub async fn set_checkout_id(&self, id: Uuid, checkout_id: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("set_payment_checkout");
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET checkout_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(checkout_id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Mark a payment completed, recording the transaction id and setting
    /// payment_date.
    pub async fn mark_completed(
        &self,
        id: Uuid,
        transaction_id: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("mark_payment_completed");
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'completed',
                transaction_id = COALESCE($2, transaction_id),
                payment_date = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(transaction_id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Mark a payment failed.
    pub async fn mark_failed(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("mark_payment_failed");
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'failed', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Count completed payments whose payment_date falls in the given
    /// calendar month. Feeds invoice numbering.
    pub async fn count_completed_in_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_completed_payments_in_month");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM payments
            WHERE status = 'completed'
              AND payment_date >= make_date($1, $2, 1)
              AND payment_date < make_date($1, $2, 1) + INTERVAL '1 month'
            "#,
        )
        .bind(year)
        .bind(month as i32)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Record the allocated invoice number on a payment.
    pub async fn set_invoice_number(
        &self,
        id: Uuid,
        invoice_number: &str,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("set_payment_invoice_number");
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET invoice_number = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(invoice_number)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// List payments, newest first, with an optional status filter.
    pub async fn list(
        &self,
        status: Option<PaymentStatusDb>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_payments");
        let query = format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE ($1::payment_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let result = sqlx::query_as::<_, PaymentEntity>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Count payments matching the status filter.
    pub async fn count(&self, status: Option<PaymentStatusDb>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_payments");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM payments
            WHERE ($1::payment_status IS NULL OR status = $1)
            "#,
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
