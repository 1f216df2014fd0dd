//! Calendar/meeting provider abstraction.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Parameters for a calendar event with an auto-generated video-meeting link.
#[derive(Debug, Clone)]
pub struct MeetingRequest {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// The sole attendee invited to the event.
    pub attendee_email: String,
}

/// A provisioned calendar event.
#[derive(Debug, Clone)]
pub struct MeetingEvent {
    pub event_id: String,
    pub join_link: String,
}

/// Errors from the meeting provider client.
#[derive(Debug, Error)]
pub enum MeetingError {
    #[error("meeting provider request failed: {0}")]
    Request(String),

    #[error("unexpected meeting provider response: {0}")]
    Response(String),
}

/// Outbound meeting provider operations.
///
/// `create_event` is not idempotent: re-invoking it provisions a second
/// event. Callers that retry must tolerate orphaned events.
#[async_trait::async_trait]
pub trait MeetingProvider: Send + Sync {
    async fn create_event(&self, request: &MeetingRequest) -> Result<MeetingEvent, MeetingError>;

    async fn update_event(
        &self,
        event_id: &str,
        request: &MeetingRequest,
    ) -> Result<(), MeetingError>;

    async fn delete_event(&self, event_id: &str) -> Result<(), MeetingError>;
}
