//! Requester identity extractor.
//!
//! Token issuance and verification live in the deployment's auth proxy, not
//! in this service; the proxy forwards the authenticated user's id in the
//! `x-user-id` header. This extractor is the seam where that identity
//! enters the application.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated requester.
#[derive(Debug, Clone, Copy)]
pub struct Requester {
    pub user_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing x-user-id header".to_string()))?;

        let user_id = header
            .parse::<Uuid>()
            .map_err(|_| ApiError::Unauthorized("Invalid x-user-id header".to_string()))?;

        Ok(Requester { user_id })
    }
}
