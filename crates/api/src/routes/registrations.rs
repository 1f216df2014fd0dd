//! Registration routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use domain::models::registration::CreateRegistrationRequest;
use domain::models::{RegistrationDetails, RegistrationStatus};
use persistence::repositories::RegistrationRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Requester;
use crate::routes::ApiResponse;
use crate::services::RegistrationOutcome;

#[derive(Debug, Serialize)]
pub struct RegistrationSummary {
    pub id: Uuid,
    pub status: RegistrationStatus,
}

#[derive(Debug, Serialize)]
pub struct PaymentSummary {
    pub id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub checkout_url: String,
}

#[derive(Debug, Serialize)]
pub struct WebinarSummary {
    pub id: Uuid,
    pub title: String,
    pub start_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CreateRegistrationResponse {
    pub registration: RegistrationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentSummary>,
    pub webinar: WebinarSummary,
}

/// Create a registration.
///
/// POST /api/registrations
///
/// Free webinars are confirmed synchronously; priced ones return a checkout
/// URL and stay pending until the payment webhook lands.
pub async fn create_registration(
    State(state): State<AppState>,
    Json(request): Json<CreateRegistrationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreateRegistrationResponse>>), ApiError> {
    request.validate()?;

    let outcome = state.registrations.create(request).await?;

    let (response, message) = match outcome {
        RegistrationOutcome::Confirmed {
            registration,
            webinar,
        } => (
            CreateRegistrationResponse {
                registration: RegistrationSummary {
                    id: registration.id,
                    status: registration.status,
                },
                payment: None,
                webinar: WebinarSummary {
                    id: webinar.id,
                    title: webinar.title,
                    start_date: webinar.start_date,
                },
            },
            "Registration confirmed.",
        ),
        RegistrationOutcome::PendingPayment {
            registration,
            payment,
            checkout_url,
            webinar,
        } => (
            CreateRegistrationResponse {
                registration: RegistrationSummary {
                    id: registration.id,
                    status: registration.status,
                },
                payment: Some(PaymentSummary {
                    id: payment.id,
                    amount: payment.amount,
                    currency: payment.currency,
                    checkout_url,
                }),
                webinar: WebinarSummary {
                    id: webinar.id,
                    title: webinar.title,
                    start_date: webinar.start_date,
                },
            },
            "Registration created. Please proceed to payment.",
        ),
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(response, message)),
    ))
}

/// Fetch a registration with its user and webinar.
///
/// GET /api/registrations/:id
pub async fn get_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RegistrationDetails>>, ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());

    let details = repo
        .find_details(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?;

    Ok(Json(ApiResponse::data(details.into())))
}

/// Cancel a registration.
///
/// DELETE /api/registrations/:id
///
/// Only the owner may cancel. The meeting event is deleted best-effort.
pub async fn cancel_registration(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.registrations.cancel(id, requester.user_id).await?;

    info!(registration_id = %id, user_id = %requester.user_id, "Registration cancelled via API");

    Ok(Json(ApiResponse::message("Registration cancelled")))
}
