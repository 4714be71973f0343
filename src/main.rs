//! Service entrypoint: configuration, database pool, router, server.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_payments::adapters::email::ResendNotificationSender;
use storefront_payments::adapters::http::payments::{api_router, PaymentsAppState};
use storefront_payments::adapters::paystack::{PaystackGateway, PaystackGatewayConfig};
use storefront_payments::adapters::postgres::PostgresOrderRepository;
use storefront_payments::adapters::stripe::{StripeGateway, StripeGatewayConfig};
use storefront_payments::config::AppConfig;
use storefront_payments::domain::payments::{PaystackWebhookVerifier, StripeWebhookVerifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    config.validate()?;

    if config.is_production() && config.payment.is_test_mode() {
        tracing::warn!("production environment is using Stripe test keys");
    }

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let state = PaymentsAppState {
        orders: Arc::new(PostgresOrderRepository::new(pool)),
        stripe_verifier: Arc::new(
            StripeWebhookVerifier::new(config.payment.stripe_webhook_secret.clone())
                .with_require_livemode(config.payment.require_livemode),
        ),
        paystack_verifier: Arc::new(PaystackWebhookVerifier::new(
            config.payment.paystack_secret_key.clone(),
        )),
        stripe_gateway: Arc::new(StripeGateway::new(StripeGatewayConfig::new(
            config.payment.stripe_secret_key.clone(),
        ))),
        paystack_gateway: Arc::new(PaystackGateway::new(PaystackGatewayConfig::new(
            config.payment.paystack_secret_key.clone(),
        ))),
        notifications: Arc::new(ResendNotificationSender::new(&config.email)),
    };

    let cors = build_cors(&config);
    let app = api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, environment = ?config.server.environment, "storefront payments service listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_cors(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        // Webhook endpoints are server-to-server; permissive CORS only
        // matters for the storefront-facing status routes in development.
        CorsLayer::permissive()
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    }
}
