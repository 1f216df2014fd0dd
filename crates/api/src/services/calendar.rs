//! Google Calendar meeting provider client.
//!
//! Creates calendar events with an auto-generated Meet link for a webinar's
//! time window and the registrant as sole attendee. The interactive OAuth
//! consent flow is out of scope: the configured refresh token is exchanged
//! for short-lived access tokens here.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use domain::services::{MeetingError, MeetingEvent, MeetingProvider, MeetingRequest};

use crate::config::CalendarConfig;

/// Request timeout for calendar calls.
const CALENDAR_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct EventResponse {
    id: Option<String>,
    #[serde(rename = "conferenceData")]
    conference_data: Option<ConferenceData>,
}

#[derive(Debug, Deserialize)]
struct ConferenceData {
    #[serde(rename = "entryPoints")]
    entry_points: Option<Vec<EntryPoint>>,
}

#[derive(Debug, Deserialize)]
struct EntryPoint {
    #[serde(rename = "entryPointType")]
    entry_point_type: Option<String>,
    uri: Option<String>,
}

/// Client for the Google Calendar v3 API.
pub struct GoogleCalendarClient {
    http: Client,
    config: CalendarConfig,
}

impl GoogleCalendarClient {
    pub fn new(config: CalendarConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(CALENDAR_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self { http, config }
    }

    /// Exchanges the refresh token for an access token.
    async fn access_token(&self) -> Result<String, MeetingError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| MeetingError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, error = %body, "Calendar token exchange failed");
            return Err(MeetingError::Response(format!(
                "token endpoint returned {status}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| MeetingError::Response(e.to_string()))?;
        Ok(token.access_token)
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.config.api_url, self.config.calendar_id
        )
    }

    fn event_body(&self, request: &MeetingRequest) -> serde_json::Value {
        json!({
            "summary": request.title,
            "description": request.description.clone().unwrap_or_default(),
            "start": {
                "dateTime": request.start_date.to_rfc3339(),
                "timeZone": self.config.timezone,
            },
            "end": {
                "dateTime": request.end_date.to_rfc3339(),
                "timeZone": self.config.timezone,
            },
            "attendees": [{ "email": request.attendee_email }],
        })
    }
}

#[async_trait::async_trait]
impl MeetingProvider for GoogleCalendarClient {
    async fn create_event(&self, request: &MeetingRequest) -> Result<MeetingEvent, MeetingError> {
        let token = self.access_token().await?;

        let mut body = self.event_body(request);
        // conferenceData asks the API to provision a Meet link with the event.
        body["conferenceData"] = json!({
            "createRequest": {
                "requestId": format!("meet-{}", Uuid::new_v4()),
                "conferenceSolutionKey": { "type": "hangoutsMeet" },
            }
        });

        let response = self
            .http
            .post(self.events_url())
            .query(&[("conferenceDataVersion", "1"), ("sendUpdates", "all")])
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| MeetingError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, error = %body, "Calendar event creation failed");
            return Err(MeetingError::Response(format!(
                "calendar returned {status}"
            )));
        }

        let event: EventResponse = response
            .json()
            .await
            .map_err(|e| MeetingError::Response(e.to_string()))?;

        let event_id = event
            .id
            .ok_or_else(|| MeetingError::Response("event id missing from response".to_string()))?;

        let join_link = event
            .conference_data
            .and_then(|c| c.entry_points)
            .unwrap_or_default()
            .into_iter()
            .find(|e| e.entry_point_type.as_deref() == Some("video"))
            .and_then(|e| e.uri)
            .ok_or_else(|| {
                MeetingError::Response("video entry point missing from response".to_string())
            })?;

        info!(event_id = %event_id, "Calendar event created");

        Ok(MeetingEvent {
            event_id,
            join_link,
        })
    }

    async fn update_event(
        &self,
        event_id: &str,
        request: &MeetingRequest,
    ) -> Result<(), MeetingError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .patch(format!("{}/{}", self.events_url(), event_id))
            .query(&[("sendUpdates", "all")])
            .bearer_auth(&token)
            .json(&self.event_body(request))
            .send()
            .await
            .map_err(|e| MeetingError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            error!(%status, event_id = %event_id, "Calendar event update failed");
            return Err(MeetingError::Response(format!(
                "calendar returned {status}"
            )));
        }

        info!(event_id = %event_id, "Calendar event updated");
        Ok(())
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), MeetingError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .delete(format!("{}/{}", self.events_url(), event_id))
            .query(&[("sendUpdates", "all")])
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| MeetingError::Request(e.to_string()))?;

        // 404/410 means the event is already gone, which is fine for deletes.
        if !response.status().is_success()
            && response.status() != reqwest::StatusCode::NOT_FOUND
            && response.status() != reqwest::StatusCode::GONE
        {
            let status = response.status();
            error!(%status, event_id = %event_id, "Calendar event deletion failed");
            return Err(MeetingError::Response(format!(
                "calendar returned {status}"
            )));
        }

        info!(event_id = %event_id, "Calendar event deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_config() -> CalendarConfig {
        CalendarConfig {
            api_url: "https://www.googleapis.com/calendar/v3".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
            calendar_id: "primary".to_string(),
            timezone: "Europe/Paris".to_string(),
        }
    }

    #[test]
    fn test_events_url() {
        let client = GoogleCalendarClient::new(test_config());
        assert_eq!(
            client.events_url(),
            "https://www.googleapis.com/calendar/v3/calendars/primary/events"
        );
    }

    #[test]
    fn test_event_body_shape() {
        let client = GoogleCalendarClient::new(test_config());
        let request = MeetingRequest {
            title: "Rust webinar".to_string(),
            description: None,
            start_date: Utc::now(),
            end_date: Utc::now(),
            attendee_email: "jane@example.com".to_string(),
        };

        let body = client.event_body(&request);
        assert_eq!(body["summary"], "Rust webinar");
        assert_eq!(body["description"], "");
        assert_eq!(body["start"]["timeZone"], "Europe/Paris");
        assert_eq!(body["attendees"][0]["email"], "jane@example.com");
    }

    #[test]
    fn test_event_response_parses_video_entry_point() {
        let raw = r#"{
            "id": "evt_1",
            "conferenceData": {
                "entryPoints": [
                    {"entryPointType": "phone", "uri": "tel:+33-1-23"},
                    {"entryPointType": "video", "uri": "https://meet.google.com/abc-defg-hij"}
                ]
            }
        }"#;

        let event: EventResponse = serde_json::from_str(raw).unwrap();
        let link = event
            .conference_data
            .and_then(|c| c.entry_points)
            .unwrap()
            .into_iter()
            .find(|e| e.entry_point_type.as_deref() == Some("video"))
            .and_then(|e| e.uri)
            .unwrap();
        assert_eq!(link, "https://meet.google.com/abc-defg-hij");
    }
}
