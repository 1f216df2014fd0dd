//! Webinar entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::WebinarStatus;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for webinar_status that maps to the PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "webinar_status", rename_all = "lowercase")]
pub enum WebinarStatusDb {
    Active,
    Cancelled,
    Completed,
}

impl From<WebinarStatusDb> for WebinarStatus {
    fn from(db_status: WebinarStatusDb) -> Self {
        match db_status {
            WebinarStatusDb::Active => WebinarStatus::Active,
            WebinarStatusDb::Cancelled => WebinarStatus::Cancelled,
            WebinarStatusDb::Completed => WebinarStatus::Completed,
        }
    }
}

impl From<WebinarStatus> for WebinarStatusDb {
    fn from(status: WebinarStatus) -> Self {
        match status {
            WebinarStatus::Active => WebinarStatusDb::Active,
            WebinarStatus::Cancelled => WebinarStatusDb::Cancelled,
            WebinarStatus::Completed => WebinarStatusDb::Completed,
        }
    }
}

/// Database row mapping for the webinars table.
#[derive(Debug, Clone, FromRow)]
pub struct WebinarEntity {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price: f64,
    pub max_participants: i32,
    pub status: WebinarStatusDb,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WebinarEntity> for domain::models::Webinar {
    fn from(entity: WebinarEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            start_date: entity.start_date,
            end_date: entity.end_date,
            price: entity.price,
            max_participants: entity.max_participants,
            status: entity.status.into(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
