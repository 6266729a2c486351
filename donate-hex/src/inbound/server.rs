//! HTTP Server configuration and startup.

use std::{sync::Arc, time::Duration};

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use donate_types::{DonateRepository, IdentityProvider, PaymentGateway};

use super::cookies::CookieSettings;
use super::handlers::{self, AppState, Redirects};
use super::rate_limit::{RateLimiterState, rate_limit_middleware};
use crate::DonateService;
use crate::openapi::ApiDoc;

/// Settings for the HTTP layer itself.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub cookie_secure: bool,
    pub redirects: Redirects,
    pub requests_per_minute: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            cookie_secure: false,
            redirects: Redirects::default(),
            requests_per_minute: 100,
        }
    }
}

/// HTTP Server for the donation API.
pub struct HttpServer<R: DonateRepository, G: PaymentGateway> {
    state: Arc<AppState<R, G>>,
    rate_limiter: Arc<RateLimiterState>,
}

impl<R: DonateRepository, G: PaymentGateway> HttpServer<R, G> {
    /// Creates a new HTTP server around the service.
    ///
    /// Without an identity provider the Google sign-in routes answer 404.
    pub fn new(
        service: DonateService<R, G>,
        settings: HttpSettings,
        identity: Option<Arc<dyn IdentityProvider>>,
    ) -> Self {
        let cookies = CookieSettings {
            secure: settings.cookie_secure,
            access_max_age_secs: service.tokens().access_max_age(),
            refresh_max_age_secs: service.tokens().refresh_max_age(),
        };

        Self {
            state: Arc::new(AppState {
                service,
                cookies,
                redirects: settings.redirects,
                identity,
            }),
            rate_limiter: Arc::new(RateLimiterState::new(
                settings.requests_per_minute,
                Duration::from_secs(60),
            )),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        // Build HTTP metrics layer (uses globally set MeterProvider)
        let metrics = axum_otel_metrics::HttpMetricsLayerBuilder::new().build();

        let auth = Router::new()
            .route("/user", post(handlers::register::<R, G>))
            .route("/login", post(handlers::login::<R, G>))
            .route("/logout", post(handlers::logout::<R, G>))
            .route("/refresh", post(handlers::refresh::<R, G>))
            .route("/google", get(handlers::google_authorize::<R, G>))
            .route("/google/redirect", get(handlers::google_callback::<R, G>));

        let users = Router::new()
            .route("/all", get(handlers::list_users::<R, G>))
            .route("/profile", get(handlers::get_profile::<R, G>))
            .route("/{id}", put(handlers::update_user::<R, G>));

        let posts = Router::new()
            .route("/create", post(handlers::create_post::<R, G>))
            .route(
                "/all_posts/{user_id}",
                get(handlers::list_posts_for_user::<R, G>),
            )
            .route(
                "/{id}",
                get(handlers::get_post::<R, G>)
                    .put(handlers::update_post::<R, G>)
                    .delete(handlers::delete_post::<R, G>),
            );

        Router::new()
            .route("/health", get(handlers::health))
            .nest("/auth", auth)
            .nest("/user", users)
            .nest("/post", posts)
            .route("/wayforpay", post(handlers::purchase::<R, G>))
            .route(
                "/wayforpay/successful",
                post(handlers::payment_approved::<R, G>),
            )
            .route(
                "/wayforpay/unsuccessful",
                post(handlers::payment_declined::<R, G>),
            )
            .route(
                "/wayforpay/setting_up_details",
                post(handlers::save_credentials::<R, G>),
            )
            .route(
                "/wayforpay/transaction_list",
                post(handlers::transaction_list::<R, G>),
            )
            .route(
                "/wayforpay/{user_id}",
                delete(handlers::delete_credentials::<R, G>),
            )
            .layer(metrics)
            .layer(middleware::from_fn_with_state(
                self.rate_limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
