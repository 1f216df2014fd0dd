//! Payment entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::PaymentStatus;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for payment_status that maps to the PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
pub enum PaymentStatusDb {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl From<PaymentStatusDb> for PaymentStatus {
    fn from(db_status: PaymentStatusDb) -> Self {
        match db_status {
            PaymentStatusDb::Pending => PaymentStatus::Pending,
            PaymentStatusDb::Completed => PaymentStatus::Completed,
            PaymentStatusDb::Failed => PaymentStatus::Failed,
            PaymentStatusDb::Refunded => PaymentStatus::Refunded,
        }
    }
}

impl From<PaymentStatus> for PaymentStatusDb {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Pending => PaymentStatusDb::Pending,
            PaymentStatus::Completed => PaymentStatusDb::Completed,
            PaymentStatus::Failed => PaymentStatusDb::Failed,
            PaymentStatus::Refunded => PaymentStatusDb::Refunded,
        }
    }
}

/// Database row mapping for the payments table.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub checkout_id: Option<String>,
    pub transaction_id: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatusDb,
    pub invoice_number: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PaymentEntity> for domain::models::Payment {
    fn from(entity: PaymentEntity) -> Self {
        Self {
            id: entity.id,
            registration_id: entity.registration_id,
            checkout_id: entity.checkout_id,
            transaction_id: entity.transaction_id,
            amount: entity.amount,
            currency: entity.currency,
            status: entity.status.into(),
            invoice_number: entity.invoice_number,
            payment_date: entity.payment_date,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
