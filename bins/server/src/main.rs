//! Expensa API Server
//!
//! Main entry point for the Expensa backend service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use expensa_api::{
    AppState,
    clients::{ExchangeRateClient, ReceiptOcrClient},
    create_router,
};
use expensa_db::connect;
use expensa_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expensa=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    };
    let jwt_service = JwtService::new(jwt_config);

    // Create outbound service clients
    let timeout = Duration::from_millis(config.services.timeout_ms);
    let rate_client =
        ExchangeRateClient::new(config.services.exchange_rate_url.clone(), timeout);
    let ocr_client = config
        .services
        .receipt_ocr_url
        .clone()
        .map(|url| Arc::new(ReceiptOcrClient::new(url, timeout)));
    info!(
        exchange_rate_url = %config.services.exchange_rate_url,
        ocr_configured = ocr_client.is_some(),
        "Outbound services configured"
    );

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        rate_client: Arc::new(rate_client),
        ocr_client,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
