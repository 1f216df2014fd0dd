//! Registration entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{
    Registration, RegistrationDetails, RegistrationStatus, User, Webinar,
};
use sqlx::FromRow;
use uuid::Uuid;

use super::webinar::WebinarStatusDb;

/// Database enum for registration_status that maps to the PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
pub enum RegistrationStatusDb {
    Pending,
    Confirmed,
    Cancelled,
}

impl From<RegistrationStatusDb> for RegistrationStatus {
    fn from(db_status: RegistrationStatusDb) -> Self {
        match db_status {
            RegistrationStatusDb::Pending => RegistrationStatus::Pending,
            RegistrationStatusDb::Confirmed => RegistrationStatus::Confirmed,
            RegistrationStatusDb::Cancelled => RegistrationStatus::Cancelled,
        }
    }
}

impl From<RegistrationStatus> for RegistrationStatusDb {
    fn from(status: RegistrationStatus) -> Self {
        match status {
            RegistrationStatus::Pending => RegistrationStatusDb::Pending,
            RegistrationStatus::Confirmed => RegistrationStatusDb::Confirmed,
            RegistrationStatus::Cancelled => RegistrationStatusDb::Cancelled,
        }
    }
}

/// Database row mapping for the registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub webinar_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub status: RegistrationStatusDb,
    pub meet_link: Option<String>,
    pub calendar_event_id: Option<String>,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RegistrationEntity> for Registration {
    fn from(entity: RegistrationEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            webinar_id: entity.webinar_id,
            payment_id: entity.payment_id,
            status: entity.status.into(),
            meet_link: entity.meet_link,
            calendar_event_id: entity.calendar_event_id,
            reminder_sent: entity.reminder_sent,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Registration row joined with its user and webinar.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationDetailsEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub webinar_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub status: RegistrationStatusDb,
    pub meet_link: Option<String>,
    pub calendar_event_id: Option<String>,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // User info
    pub user_email: String,
    pub user_name: String,
    pub user_company: Option<String>,
    pub user_created_at: DateTime<Utc>,
    pub user_updated_at: DateTime<Utc>,
    // Webinar info
    pub webinar_title: String,
    pub webinar_description: Option<String>,
    pub webinar_start_date: DateTime<Utc>,
    pub webinar_end_date: DateTime<Utc>,
    pub webinar_price: f64,
    pub webinar_max_participants: i32,
    pub webinar_status: WebinarStatusDb,
    pub webinar_created_at: DateTime<Utc>,
    pub webinar_updated_at: DateTime<Utc>,
}

impl From<RegistrationDetailsEntity> for RegistrationDetails {
    fn from(entity: RegistrationDetailsEntity) -> Self {
        Self {
            registration: Registration {
                id: entity.id,
                user_id: entity.user_id,
                webinar_id: entity.webinar_id,
                payment_id: entity.payment_id,
                status: entity.status.into(),
                meet_link: entity.meet_link,
                calendar_event_id: entity.calendar_event_id,
                reminder_sent: entity.reminder_sent,
                created_at: entity.created_at,
                updated_at: entity.updated_at,
            },
            user: User {
                id: entity.user_id,
                email: entity.user_email,
                name: entity.user_name,
                company: entity.user_company,
                created_at: entity.user_created_at,
                updated_at: entity.user_updated_at,
            },
            webinar: Webinar {
                id: entity.webinar_id,
                title: entity.webinar_title,
                description: entity.webinar_description,
                start_date: entity.webinar_start_date,
                end_date: entity.webinar_end_date,
                price: entity.webinar_price,
                max_participants: entity.webinar_max_participants,
                status: entity.webinar_status.into(),
                created_at: entity.webinar_created_at,
                updated_at: entity.webinar_updated_at,
            },
        }
    }
}
