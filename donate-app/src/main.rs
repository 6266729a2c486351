//! # Donation Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository adapter
//! - Create the gateway client and the donation service
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use donate_hex::{
    DonateService, ServiceConfig,
    inbound::{HttpServer, HttpSettings, Redirects},
    outbound::{GoogleConfig, GoogleIdentityProvider},
    service::TokenConfig,
};
use donate_repo::{build_repo, security::SecretCipher};
use donate_types::IdentityProvider;
use wayforpay::{ClientConfig, MerchantSettings, WayforpayClient};

/// Builds the OTLP exporter. Only called when a collector endpoint is configured.
fn init_tracer() -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("donate-service"), provider))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let otel = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(_) => Some(init_tracer()?),
        Err(_) => None,
    };
    let telemetry = otel
        .as_ref()
        .map(|(tracer, _)| tracing_opentelemetry::layer().with_tracer(tracer.clone()));

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,donate_app=debug,donate_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting donation server on port {}", config.port);
    tracing::info!(
        "Using database: {}",
        config.database_url.split(':').next().unwrap_or("unknown")
    );

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await?;

    let cipher = SecretCipher::new(&config.encryption_key)?;
    let gateway = WayforpayClient::new(ClientConfig {
        payment_url: config.wayforpay.payment_url.clone(),
        transaction_list_url: config.wayforpay.transaction_list_url.clone(),
        timeout: config.wayforpay.timeout,
    })?;

    let service = DonateService::new(
        repo,
        gateway,
        cipher,
        ServiceConfig {
            tokens: TokenConfig {
                secret: config.jwt_secret.clone(),
                access_ttl_minutes: config.access_token_ttl_minutes,
                refresh_ttl_days: config.refresh_token_ttl_days,
            },
            merchant: MerchantSettings {
                domain_name: config.wayforpay.merchant_domain_name.clone(),
                approved_url: config.wayforpay.approved_url.clone(),
                declined_url: config.wayforpay.declined_url.clone(),
            },
        },
    );

    let identity: Option<Arc<dyn IdentityProvider>> = match config.google {
        Some(google) => {
            let provider = GoogleIdentityProvider::new(GoogleConfig {
                client_id: google.client_id,
                client_secret: google.client_secret,
                callback_url: google.callback_url,
            })?;
            Some(Arc::new(provider) as Arc<dyn IdentityProvider>)
        }
        None => {
            tracing::info!("Google sign-in disabled");
            None
        }
    };

    // Create and run the HTTP server
    let server = HttpServer::new(
        service,
        HttpSettings {
            cookie_secure: config.cookie_secure,
            redirects: Redirects {
                approved: config.wayforpay.approved_redirect_url,
                declined: config.wayforpay.declined_redirect_url,
                after_oauth: config.oauth_redirect_url,
            },
            requests_per_minute: config.rate_limit_per_minute,
        },
        identity,
    );
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Ensure traces are flushed before exit
    if let Some((_, provider)) = otel {
        let _ = provider.shutdown();
    }
    Ok(())
}
