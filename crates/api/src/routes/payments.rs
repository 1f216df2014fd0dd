//! Payment routes: the gateway webhook, status queries, the checkout return
//! page, and the admin listing.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Html,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use domain::models::{Payment, PaymentStatus};
use domain::services::CheckoutStatus;
use persistence::entities::PaymentStatusDb;
use persistence::repositories::PaymentRepository;
use shared::pagination::{PageMeta, PageParams};

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::ApiResponse;

/// Header carrying the gateway's webhook signature.
pub const SIGNATURE_HEADER: &str = "x-sumup-signature";

/// Gateway payment notification.
///
/// POST /api/payment/webhook
///
/// The signature is an HMAC over the raw body, so the handler takes the
/// body as bytes and parses JSON only after verification.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    state.webhook.handle(&body, signature).await?;

    Ok(Json(ApiResponse::message("Webhook processed")))
}

/// Check the status of a payment.
///
/// GET /api/payment/:id/status
///
/// A payment still pending locally is refreshed from the gateway before
/// answering, persisting any terminal status it reports.
pub async fn payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Payment>>, ApiError> {
    let repo = PaymentRepository::new(state.pool.clone());

    let payment: Payment = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".to_string()))?
        .into();

    if payment.status == PaymentStatus::Pending {
        if let Some(checkout_id) = &payment.checkout_id {
            let status = state.gateway.checkout_status(checkout_id).await?;
            match status.status {
                CheckoutStatus::Completed => {
                    repo.mark_completed(id, status.transaction_id.as_deref())
                        .await?;
                    info!(payment_id = %id, "Payment completed (status poll)");
                }
                CheckoutStatus::Failed => {
                    repo.mark_failed(id).await?;
                    info!(payment_id = %id, "Payment failed (status poll)");
                }
                CheckoutStatus::Pending => {}
            }
        }
    }

    let payment: Payment = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".to_string()))?
        .into();

    Ok(Json(ApiResponse::data(payment)))
}

#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    pub checkout_id: Option<String>,
}

/// Landing page the gateway redirects the payer to after checkout.
///
/// GET /api/payment/return?checkout_id=...
pub async fn payment_return(
    State(state): State<AppState>,
    Query(query): Query<ReturnQuery>,
) -> Result<Html<String>, ApiError> {
    let checkout_id = query
        .checkout_id
        .ok_or_else(|| ApiError::validation("Missing checkout_id"))?;

    let status = state.gateway.checkout_status(&checkout_id).await?;

    let (title, heading, text) = match status.status {
        CheckoutStatus::Completed => (
            "Payment successful",
            "Payment successful!",
            "Your registration has been confirmed. You will receive an email with all the details.",
        ),
        CheckoutStatus::Failed => (
            "Payment failed",
            "Payment failed",
            "The payment could not be completed. Please try again or contact us.",
        ),
        CheckoutStatus::Pending => (
            "Payment in progress",
            "Payment in progress",
            "Your payment is being processed. You will receive a confirmation email shortly.",
        ),
    };

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>
    body {{ font-family: Arial, sans-serif; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: #f0f0f0; }}
    .container {{ background: white; padding: 40px; border-radius: 10px; text-align: center; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }}
    h1 {{ color: #333; }}
    p {{ color: #666; }}
  </style>
</head>
<body>
  <div class="container">
    <h1>{heading}</h1>
    <p>{text}</p>
  </div>
</body>
</html>"#
    )))
}

#[derive(Debug, Deserialize)]
pub struct PaymentListQuery {
    pub status: Option<PaymentStatus>,
    // serde_urlencoded cannot deserialize numbers through #[serde(flatten)],
    // so the page params are inlined.
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, serde::Serialize)]
pub struct PaymentListResponse {
    pub payments: Vec<Payment>,
    pub pagination: PageMeta,
}

/// List payments (administrative).
///
/// GET /api/payment?status=completed&page=1&limit=50
pub async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<PaymentListQuery>,
) -> Result<Json<ApiResponse<PaymentListResponse>>, ApiError> {
    let repo = PaymentRepository::new(state.pool.clone());

    let page = PageParams {
        page: query.page,
        limit: query.limit,
    };
    let status_db = query.status.map(PaymentStatusDb::from);
    let payments = repo.list(status_db, page.limit(), page.offset()).await?;
    let total = repo.count(status_db).await?;

    Ok(Json(ApiResponse::data(PaymentListResponse {
        payments: payments.into_iter().map(Into::into).collect(),
        pagination: PageMeta::new(total, &page),
    })))
}
