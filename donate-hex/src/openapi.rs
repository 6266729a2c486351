//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use donate_types::domain::{FieldValue, Post, PostId, UserId, UserRole};
use donate_types::dto::{
    AuthResponse, CreatePostRequest, LoginRequest, MessageResponse, PurchaseResponse,
    RegisterRequest, SaveCredentialsRequest, TransactionListRequest, UpdatePostRequest,
    UpdateUserRequest, UserProfile,
};
use utoipa::{
    Modify, OpenApi, ToSchema,
    openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme},
};

/// Purchase body as documented. Any other top-level field is forwarded to
/// the gateway form and overrides the generated value of the same name.
#[derive(serde::Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct PurchaseBody {
    product_name: FieldValue,
    #[schema(example = 250.0)]
    amount: f64,
}

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Register a local account
#[utoipa::path(
    post,
    path = "/auth/user",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered; auth cookies set", body = AuthResponse),
        (status = 400, description = "Password mismatch or email already in use")
    )
)]
async fn register() {}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; auth cookies set", body = AuthResponse),
        (status = 400, description = "Invalid email or password")
    )
)]
async fn login() {}

/// Clear the auth cookies
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses((status = 204, description = "Cookies cleared"))
)]
async fn logout() {}

/// Exchange the refresh cookie for a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    security(("refresh_cookie" = [])),
    responses(
        (status = 200, description = "New auth cookies set", body = AuthResponse),
        (status = 401, description = "Missing, invalid or expired refresh token")
    )
)]
async fn refresh() {}

/// Start Google sign-in
#[utoipa::path(
    get,
    path = "/auth/google",
    tag = "auth",
    responses(
        (status = 303, description = "Redirect to the Google consent page"),
        (status = 404, description = "Google sign-in is not configured")
    )
)]
async fn google_authorize() {}

/// Google sign-in callback
#[utoipa::path(
    get,
    path = "/auth/google/redirect",
    tag = "auth",
    params(("code" = String, Query, description = "Authorization code")),
    responses(
        (status = 200, description = "Signed in; auth cookies set", body = AuthResponse),
        (status = 303, description = "Signed in; redirected to the frontend"),
        (status = 400, description = "Code missing or rejected by Google")
    )
)]
async fn google_callback() {}

/// List all users
#[utoipa::path(
    get,
    path = "/user/all",
    tag = "users",
    responses((status = 200, description = "All users", body = Vec<UserProfile>))
)]
async fn list_users() {}

/// Profile of a user, the caller by default
#[utoipa::path(
    get,
    path = "/user/profile",
    tag = "users",
    security(("bearer_auth" = []), ("access_cookie" = [])),
    params(("uuid" = Option<String>, Query, description = "User ID; defaults to the caller")),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    )
)]
async fn get_profile() {}

/// Update the caller's profile
#[utoipa::path(
    put,
    path = "/user/{id}",
    tag = "users",
    request_body = UpdateUserRequest,
    security(("bearer_auth" = []), ("access_cookie" = [])),
    params(("id" = UserId, Path, description = "User ID (UUID)")),
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the caller's profile"),
        (status = 404, description = "User not found")
    )
)]
async fn update_user() {}

/// Publish a fundraising post
#[utoipa::path(
    post,
    path = "/post/create",
    tag = "posts",
    request_body = CreatePostRequest,
    security(("bearer_auth" = []), ("access_cookie" = [])),
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Blank title, content or goal"),
        (status = 401, description = "Unauthorized")
    )
)]
async fn create_post() {}

/// Get a post by ID
#[utoipa::path(
    get,
    path = "/post/{id}",
    tag = "posts",
    params(("id" = PostId, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post details", body = Post),
        (status = 404, description = "Post not found")
    )
)]
async fn get_post() {}

/// List a user's posts, newest first
#[utoipa::path(
    get,
    path = "/post/all_posts/{user_id}",
    tag = "posts",
    params(("user_id" = UserId, Path, description = "Owner ID (UUID)")),
    responses(
        (status = 200, description = "Posts of the user", body = Vec<Post>),
        (status = 404, description = "User not found")
    )
)]
async fn list_posts_for_user() {}

/// Update a post the caller owns
#[utoipa::path(
    put,
    path = "/post/{id}",
    tag = "posts",
    request_body = UpdatePostRequest,
    security(("bearer_auth" = []), ("access_cookie" = [])),
    params(("id" = PostId, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Updated post", body = Post),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Post not found")
    )
)]
async fn update_post() {}

/// Delete a post the caller owns
#[utoipa::path(
    delete,
    path = "/post/{id}",
    tag = "posts",
    security(("bearer_auth" = []), ("access_cookie" = [])),
    params(("id" = PostId, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Post not found")
    )
)]
async fn delete_post() {}

/// Sign and submit a purchase with the caller's merchant credentials
#[utoipa::path(
    post,
    path = "/wayforpay",
    tag = "wayforpay",
    request_body = PurchaseBody,
    security(("bearer_auth" = []), ("access_cookie" = [])),
    responses(
        (status = 200, description = "Payment page URL", body = PurchaseResponse),
        (status = 400, description = "Invalid amount or the gateway rejected the request"),
        (status = 403, description = "Stored merchant secret is unusable"),
        (status = 404, description = "No merchant credentials on file")
    )
)]
async fn purchase() {}

/// Gateway return URL for approved payments
#[utoipa::path(
    post,
    path = "/wayforpay/successful",
    tag = "wayforpay",
    responses((status = 303, description = "Redirect to the approved page"))
)]
async fn payment_approved() {}

/// Gateway return URL for declined payments
#[utoipa::path(
    post,
    path = "/wayforpay/unsuccessful",
    tag = "wayforpay",
    responses((status = 303, description = "Redirect to the declined page"))
)]
async fn payment_declined() {}

/// Store the caller's merchant credentials
#[utoipa::path(
    post,
    path = "/wayforpay/setting_up_details",
    tag = "wayforpay",
    request_body = SaveCredentialsRequest,
    security(("bearer_auth" = []), ("access_cookie" = [])),
    responses(
        (status = 201, description = "Credentials saved", body = MessageResponse),
        (status = 409, description = "Credentials already exist")
    )
)]
async fn save_credentials() {}

/// Delete a user's merchant credentials
#[utoipa::path(
    delete,
    path = "/wayforpay/{user_id}",
    tag = "wayforpay",
    security(("bearer_auth" = []), ("access_cookie" = [])),
    params(("user_id" = UserId, Path, description = "Credential owner (UUID)")),
    responses(
        (status = 204, description = "Credentials deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No credentials on file")
    )
)]
async fn delete_credentials() {}

/// Transactions of the caller's merchant account for at most 31 days
#[utoipa::path(
    post,
    path = "/wayforpay/transaction_list",
    tag = "wayforpay",
    request_body = TransactionListRequest,
    security(("bearer_auth" = []), ("access_cookie" = [])),
    responses(
        (status = 200, description = "Gateway transactions", body = inline(serde_json::Value)),
        (status = 400, description = "Window wider than 31 days or gateway failure"),
        (status = 404, description = "No merchant credentials on file")
    )
)]
async fn transaction_list() {}

/// OpenAPI documentation for the donation API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Donation Service API",
        version = "1.0.0",
        description = "Users, fundraising posts and WayForPay payments.\n\n## Authentication\n\nRegistering or logging in sets the `access_token` and `refresh_token` cookies. The access token is also accepted in the `Authorization` header:\n\n```\nAuthorization: Bearer <access token>\n```",
        license(name = "MIT"),
    ),
    paths(
        health,
        register,
        login,
        logout,
        refresh,
        google_authorize,
        google_callback,
        list_users,
        get_profile,
        update_user,
        create_post,
        get_post,
        list_posts_for_user,
        update_post,
        delete_post,
        purchase,
        payment_approved,
        payment_declined,
        save_credentials,
        delete_credentials,
        transaction_list,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            UserProfile,
            UpdateUserRequest,
            UserRole,
            UserId,
            Post,
            PostId,
            CreatePostRequest,
            UpdatePostRequest,
            FieldValue,
            PurchaseBody,
            PurchaseResponse,
            SaveCredentialsRequest,
            TransactionListRequest,
            MessageResponse,
        )
    ),

    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and token cookies"),
        (name = "users", description = "User profiles"),
        (name = "posts", description = "Fundraising posts"),
        (name = "wayforpay", description = "Merchant credentials, purchases and transaction lists"),
    )
)]
pub struct ApiDoc;

/// Security schemes for the bearer header and the auth cookies.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
            components.add_security_scheme(
                "access_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("access_token"))),
            );
            components.add_security_scheme(
                "refresh_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("refresh_token"))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/auth/user",
            "/auth/google/redirect",
            "/user/profile",
            "/post/{id}",
            "/post/all_posts/{user_id}",
            "/wayforpay",
            "/wayforpay/{user_id}",
            "/wayforpay/transaction_list",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
