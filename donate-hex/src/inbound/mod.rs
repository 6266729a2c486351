//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the application layer.

mod auth;
mod cookies;
mod handlers;
mod rate_limit;
mod server;

pub use auth::CurrentUser;
pub use cookies::{ACCESS_COOKIE, CookieSettings, REFRESH_COOKIE};
pub use handlers::{ApiError, AppState, Redirects};
pub use server::{HttpServer, HttpSettings};
