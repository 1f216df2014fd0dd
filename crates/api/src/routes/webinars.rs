//! Webinar management routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use domain::models::webinar::{
    validate_schedule, CreateWebinarRequest, UpdateWebinarRequest, WebinarStats,
};
use domain::models::{RegistrationDetails, Webinar, WebinarStatus};
use persistence::entities::WebinarStatusDb;
use persistence::repositories::{RegistrationRepository, WebinarRepository};
use shared::pagination::{PageMeta, PageParams};

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct WebinarListQuery {
    pub status: Option<WebinarStatus>,
    #[serde(default)]
    pub upcoming: bool,
    // serde_urlencoded cannot deserialize numbers through #[serde(flatten)],
    // so the page params are inlined.
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl WebinarListQuery {
    fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WebinarListResponse {
    pub webinars: Vec<Webinar>,
    pub pagination: PageMeta,
}

#[derive(Debug, Serialize)]
pub struct WebinarDetailResponse {
    #[serde(flatten)]
    pub webinar: Webinar,
    pub stats: WebinarStats,
}

#[derive(Debug, Serialize)]
pub struct WebinarRegistrationsResponse {
    pub webinar: WebinarRef,
    pub registrations: Vec<RegistrationDetails>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct WebinarRef {
    pub id: Uuid,
    pub title: String,
    pub start_date: chrono::DateTime<chrono::Utc>,
}

/// Create a webinar.
///
/// POST /api/webinars
pub async fn create_webinar(
    State(state): State<AppState>,
    Json(request): Json<CreateWebinarRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Webinar>>), ApiError> {
    request.validate()?;
    validate_schedule(request.start_date, request.end_date)
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let repo = WebinarRepository::new(state.pool.clone());
    let webinar = repo
        .create(
            &request.title,
            request.description.as_deref(),
            request.start_date,
            request.end_date,
            request.price,
            request.max_participants.unwrap_or(100),
        )
        .await?;

    info!(webinar_id = %webinar.id, title = %webinar.title, "Webinar created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            webinar.into(),
            "Webinar created",
        )),
    ))
}

/// List webinars.
///
/// GET /api/webinars?status=active&upcoming=true&page=1&limit=50
pub async fn list_webinars(
    State(state): State<AppState>,
    Query(query): Query<WebinarListQuery>,
) -> Result<Json<ApiResponse<WebinarListResponse>>, ApiError> {
    let repo = WebinarRepository::new(state.pool.clone());

    let filter = persistence::repositories::webinar::WebinarListFilter {
        status: query.status.map(WebinarStatusDb::from),
        upcoming: query.upcoming,
    };

    let page = query.page_params();
    let webinars = repo.list(filter, page.limit(), page.offset()).await?;
    let total = repo.count(filter).await?;

    Ok(Json(ApiResponse::data(WebinarListResponse {
        webinars: webinars.into_iter().map(Into::into).collect(),
        pagination: PageMeta::new(total, &page),
    })))
}

/// Fetch a webinar with registration statistics.
///
/// GET /api/webinars/:id
pub async fn get_webinar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WebinarDetailResponse>>, ApiError> {
    let repo = WebinarRepository::new(state.pool.clone());

    let webinar: Webinar = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Webinar not found".to_string()))?
        .into();

    let registrations = repo.count_confirmed_registrations(id).await?;
    let available_spots = (webinar.max_participants as i64 - registrations).max(0);

    Ok(Json(ApiResponse::data(WebinarDetailResponse {
        stats: WebinarStats {
            registrations,
            available_spots,
            is_full: registrations >= webinar.max_participants as i64,
        },
        webinar,
    })))
}

/// Update a webinar.
///
/// PUT /api/webinars/:id
pub async fn update_webinar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWebinarRequest>,
) -> Result<Json<ApiResponse<Webinar>>, ApiError> {
    request.validate()?;

    let repo = WebinarRepository::new(state.pool.clone());
    let existing: Webinar = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Webinar not found".to_string()))?
        .into();

    // Re-check date coherence against the merged schedule.
    let start = request.start_date.unwrap_or(existing.start_date);
    let end = request.end_date.unwrap_or(existing.end_date);
    validate_schedule(start, end).map_err(|e| ApiError::validation(e.to_string()))?;

    let webinar = repo
        .update(
            id,
            request.title.as_deref(),
            request.description.as_deref(),
            request.start_date,
            request.end_date,
            request.price,
            request.max_participants,
            request.status.map(WebinarStatusDb::from),
        )
        .await?;

    info!(webinar_id = %id, "Webinar updated");

    Ok(Json(ApiResponse::with_message(
        webinar.into(),
        "Webinar updated",
    )))
}

/// Delete a webinar.
///
/// DELETE /api/webinars/:id
///
/// Rejected while the webinar still has confirmed registrations.
pub async fn delete_webinar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let repo = WebinarRepository::new(state.pool.clone());

    repo.find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Webinar not found".to_string()))?;

    let registrations = repo.count_confirmed_registrations(id).await?;
    if registrations > 0 {
        return Err(ApiError::Conflict(
            "Cannot delete a webinar with confirmed registrations".to_string(),
        ));
    }

    repo.delete(id).await?;

    info!(webinar_id = %id, "Webinar deleted");

    Ok(Json(ApiResponse::message("Webinar deleted")))
}

/// List the registrations of a webinar.
///
/// GET /api/webinars/:id/registrations
pub async fn get_webinar_registrations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WebinarRegistrationsResponse>>, ApiError> {
    let webinar_repo = WebinarRepository::new(state.pool.clone());
    let registration_repo = RegistrationRepository::new(state.pool.clone());

    let webinar: Webinar = webinar_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Webinar not found".to_string()))?
        .into();

    let registrations: Vec<RegistrationDetails> = registration_repo
        .find_by_webinar(id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ApiResponse::data(WebinarRegistrationsResponse {
        webinar: WebinarRef {
            id: webinar.id,
            title: webinar.title,
            start_date: webinar.start_date,
        },
        total: registrations.len(),
        registrations,
    })))
}
