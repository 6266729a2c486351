//! Authentication extractor for JWT access tokens.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use donate_types::{AppError, DonateRepository, PaymentGateway, UserId};

use super::cookies::{ACCESS_COOKIE, extract_cookie};
use super::handlers::{ApiError, AppState};

/// Extracts the token from an Authorization header value.
/// Expected format: "Bearer <token>"
fn extract_bearer(auth_header: Option<&str>) -> Option<&str> {
    auth_header?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Finds the caller's access token: the `access_token` cookie first, then
/// the Authorization header.
pub(crate) fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    extract_cookie(headers, ACCESS_COOKIE).or_else(|| {
        let auth_header = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        extract_bearer(auth_header).map(str::to_string)
    })
}

/// The authenticated caller.
///
/// Adding this extractor to a handler makes the route require a valid
/// access token whose subject still exists.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
}

impl<R, G> FromRequestParts<Arc<AppState<R, G>>> for CurrentUser
where
    R: DonateRepository,
    G: PaymentGateway,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<R, G>>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_access_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Missing access token".into()))?;

        let user = state.service.authenticate(&token).await?;

        Ok(CurrentUser {
            id: user.id,
            email: user.email,
        })
    }
}
