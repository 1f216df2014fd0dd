//! Registration domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::{RegistrantInfo, User};
use super::webinar::Webinar;

/// Registration lifecycle status.
///
/// `pending` is the initial state; `confirmed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Pending => write!(f, "pending"),
            RegistrationStatus::Confirmed => write!(f, "confirmed"),
            RegistrationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A user's registration for a webinar. Meeting link and calendar event id
/// are populated only after confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Registration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub webinar_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub status: RegistrationStatus,
    pub meet_link: Option<String>,
    pub calendar_event_id: Option<String>,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A registration joined with its user and webinar.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationDetails {
    #[serde(flatten)]
    pub registration: Registration,
    pub user: User,
    pub webinar: Webinar,
}

/// Request to register for a webinar.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateRegistrationRequest {
    pub webinar_id: Uuid,

    #[validate(nested)]
    pub user: RegistrantInfo,
}
