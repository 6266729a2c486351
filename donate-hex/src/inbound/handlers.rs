//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use donate_types::{
    AppError, AuthResponse, CreatePostRequest, DonateRepository, IdentityProvider, LoginRequest,
    PaymentGateway, PostId, PurchaseRequest, RegisterRequest, SaveCredentialsRequest,
    TransactionListRequest, UpdatePostRequest, UpdateUserRequest, UserId,
};

use super::auth::CurrentUser;
use super::cookies::{CookieSettings, REFRESH_COOKIE, extract_cookie, to_header_values};
use crate::DonateService;
use crate::service::AuthOutcome;

/// Where the browser is sent after leaving the payment page or the OAuth flow.
#[derive(Debug, Clone, Default)]
pub struct Redirects {
    pub approved: String,
    pub declined: String,
    /// When set, a finished OAuth sign-in redirects here instead of
    /// answering with JSON.
    pub after_oauth: Option<String>,
}

/// Application state shared across handlers.
pub struct AppState<R: DonateRepository, G: PaymentGateway> {
    pub service: DonateService<R, G>,
    pub cookies: CookieSettings,
    pub redirects: Redirects,
    pub identity: Option<Arc<dyn IdentityProvider>>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Upstream(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

type SetCookies = AppendHeaders<Vec<(HeaderName, HeaderValue)>>;

fn set_cookies(values: [String; 2]) -> SetCookies {
    AppendHeaders(
        to_header_values(values)
            .into_iter()
            .map(|value| (header::SET_COOKIE, value))
            .collect(),
    )
}

fn signed_in(cookies: &CookieSettings, outcome: AuthOutcome) -> (SetCookies, Json<AuthResponse>) {
    let headers = set_cookies(
        cookies.token_cookies(&outcome.tokens.access_token, &outcome.tokens.refresh_token),
    );
    (
        headers,
        Json(AuthResponse {
            user_id: outcome.user_id,
        }),
    )
}

fn parse_user_id(raw: &str) -> Result<UserId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid user ID".into()))
}

fn parse_post_id(raw: &str) -> Result<PostId, AppError> {
    raw.parse::<i64>()
        .map(PostId::new)
        .map_err(|_| AppError::BadRequest("Invalid post ID".into()))
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Register a local account.
#[tracing::instrument(skip(state, req))]
pub async fn register<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.service.register(req).await?;
    Ok((StatusCode::CREATED, signed_in(&state.cookies, outcome)))
}

#[tracing::instrument(skip(state, req))]
pub async fn login<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.service.login(req).await?;
    Ok(signed_in(&state.cookies, outcome))
}

/// Clears both auth cookies.
pub async fn logout<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        set_cookies(state.cookies.cleared_cookies()),
    )
}

/// Trade the refresh cookie for a new token pair.
#[tracing::instrument(skip_all)]
pub async fn refresh<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_cookie(&headers, REFRESH_COOKIE)
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".into()))?;

    let outcome = state.service.refresh(&token).await?;
    Ok(signed_in(&state.cookies, outcome))
}

fn identity_provider<R: DonateRepository, G: PaymentGateway>(
    state: &AppState<R, G>,
) -> Result<&Arc<dyn IdentityProvider>, AppError> {
    state
        .identity
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Google sign-in is not configured".into()))
}

/// Send the browser to the provider's consent page.
pub async fn google_authorize<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = identity_provider(&*state)?;
    Ok(Redirect::to(&provider.authorize_url()))
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// OAuth callback: exchange the code, sign the user in.
#[tracing::instrument(skip(state, query))]
pub async fn google_callback<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Query(query): Query<OAuthCallback>,
) -> Result<Response, ApiError> {
    let provider = identity_provider(&*state)?;

    if let Some(error) = query.error {
        tracing::warn!(error = %error, "oauth consent refused");
        return Err(AppError::Unauthorized("Google sign-in was cancelled".into()).into());
    }
    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".into()))?;

    let profile = provider.exchange_code(&code).await.map_err(|e| {
        tracing::error!(error = %e, "oauth code exchange failed");
        AppError::Upstream("Failed to sign in with Google".into())
    })?;

    let outcome = state.service.oauth_sign_in(profile).await?;
    let (cookies, body) = signed_in(&state.cookies, outcome);

    Ok(match &state.redirects.after_oauth {
        Some(url) => (cookies, Redirect::to(url)).into_response(),
        None => (cookies, body).into_response(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state))]
pub async fn list_users<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.service.list_users().await?;
    Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub uuid: Option<String>,
}

/// Profile of `?uuid=`, or of the caller when omitted.
#[tracing::instrument(skip(state, user), fields(caller = %user.id))]
pub async fn get_profile<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    user: CurrentUser,
    Query(query): Query<ProfileQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = match query.uuid.as_deref() {
        Some(raw) => parse_user_id(raw)?,
        None => user.id,
    };

    let profile = state.service.get_profile(id).await?;
    Ok(Json(profile))
}

#[tracing::instrument(skip(state, user, patch), fields(caller = %user.id, user_id = %id))]
pub async fn update_user<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target = parse_user_id(&id)?;
    let profile = state.service.update_user(user.id, target, patch).await?;
    Ok(Json(profile))
}

// ─────────────────────────────────────────────────────────────────────────────
// Posts
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state, user, req), fields(owner = %user.id))]
pub async fn create_post<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    user: CurrentUser,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.service.create_post(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

#[tracing::instrument(skip(state), fields(post_id = %id))]
pub async fn get_post<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.service.get_post(parse_post_id(&id)?).await?;
    Ok(Json(post))
}

/// All posts of one user, newest first.
#[tracing::instrument(skip(state), fields(owner = %user_id))]
pub async fn list_posts_for_user<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = parse_user_id(&user_id)?;
    let posts = state.service.list_posts_for_user(owner).await?;
    Ok(Json(posts))
}

#[tracing::instrument(skip(state, user, patch), fields(caller = %user.id, post_id = %id))]
pub async fn update_post<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .service
        .update_post(user.id, parse_post_id(&id)?, patch)
        .await?;
    Ok(Json(post))
}

#[tracing::instrument(skip(state, user), fields(caller = %user.id, post_id = %id))]
pub async fn delete_post<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.delete_post(user.id, parse_post_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// WayForPay
// ─────────────────────────────────────────────────────────────────────────────

/// Sign a purchase with the caller's merchant credentials and submit it.
#[tracing::instrument(skip(state, user, req), fields(caller = %user.id, amount = req.amount))]
pub async fn purchase<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    user: CurrentUser,
    Json(req): Json<PurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.service.create_purchase(user.id, req).await?;
    Ok(Json(response))
}

/// Gateway return URL for approved payments.
pub async fn payment_approved<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
) -> Redirect {
    Redirect::to(&state.redirects.approved)
}

/// Gateway return URL for declined payments.
pub async fn payment_declined<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
) -> Redirect {
    Redirect::to(&state.redirects.declined)
}

#[tracing::instrument(skip(state, user, req), fields(caller = %user.id))]
pub async fn save_credentials<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    user: CurrentUser,
    Json(req): Json<SaveCredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state.service.save_credentials(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[tracing::instrument(skip(state, user), fields(caller = %user.id, target = %user_id))]
pub async fn delete_credentials<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let target = parse_user_id(&user_id)?;
    state.service.delete_credentials(user.id, target).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(
    skip(state, user, req),
    fields(caller = %user.id, date_begin = req.date_begin, date_end = req.date_end)
)]
pub async fn transaction_list<R: DonateRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    user: CurrentUser,
    Json(req): Json<TransactionListRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = state.service.transaction_list(user.id, req).await?;
    Ok(Json(transactions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::Upstream("x".into()), StatusCode::BAD_REQUEST),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_parse_ids() {
        assert!(parse_post_id("42").is_ok());
        assert!(matches!(parse_post_id("abc"), Err(AppError::BadRequest(_))));
        assert!(matches!(
            parse_user_id("not-a-uuid"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_set_cookies_emits_both() {
        let AppendHeaders(headers) = set_cookies(CookieSettings::default().cleared_cookies());
        assert_eq!(headers.len(), 2);
        assert!(headers.iter().all(|(name, _)| name == header::SET_COOKIE));
    }
}
