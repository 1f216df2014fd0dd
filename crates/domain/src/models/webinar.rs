//! Webinar domain model and management DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Webinar lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebinarStatus {
    Active,
    Cancelled,
    Completed,
}

impl std::fmt::Display for WebinarStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebinarStatus::Active => write!(f, "active"),
            WebinarStatus::Cancelled => write!(f, "cancelled"),
            WebinarStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A scheduled webinar. `end_date` is strictly after `start_date`; this is
/// enforced at creation and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Webinar {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Price in EUR. Zero means the webinar is free.
    pub price: f64,
    pub max_participants: i32,
    pub status: WebinarStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Webinar {
    /// Whether registering requires payment.
    pub fn is_paid(&self) -> bool {
        self.price > 0.0
    }
}

/// Request to create a webinar.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateWebinarRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub start_date: DateTime<Utc>,

    pub end_date: DateTime<Utc>,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,

    #[validate(range(min = 1, message = "max_participants must be at least 1"))]
    pub max_participants: Option<i32>,
}

/// Request to update a webinar. All fields optional; date coherence is
/// re-checked against the stored values.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateWebinarRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub start_date: Option<DateTime<Utc>>,

    pub end_date: Option<DateTime<Utc>>,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,

    #[validate(range(min = 1, message = "max_participants must be at least 1"))]
    pub max_participants: Option<i32>,

    pub status: Option<WebinarStatus>,
}

/// Checks the end-after-start invariant shared by create and update.
pub fn validate_schedule(
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Result<(), ScheduleError> {
    if end_date <= start_date {
        return Err(ScheduleError::EndNotAfterStart);
    }
    Ok(())
}

/// Schedule validation failure.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("end_date must be after start_date")]
    EndNotAfterStart,
}

/// Registration statistics included in webinar detail responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct WebinarStats {
    pub registrations: i64,
    pub available_spots: i64,
    pub is_full: bool,
}
