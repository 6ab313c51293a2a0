use std::sync::Arc;

use axum::{http::StatusCode, response::Json};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courseloom_common::ApiResponse;
use courseloom_database::create_pool;
use courseloom_webhooks::{
    config::SyncConfig, routes, store::PgSyncStore, stripe::StripeClient,
    verify::IdentityWebhookVerifier, AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courseloom_webhooks=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = SyncConfig::from_env()?;

    // Create database connection pool
    let db_pool = create_pool(&config.database).await?;

    // Run migrations
    courseloom_database::run_migrations(&db_pool).await?;

    // Provider seams
    let identity_verifier =
        IdentityWebhookVerifier::new(&config.identity.signing_secret, config.identity.tolerance_secs)?;
    let stripe = StripeClient::new(&config.stripe);

    // Build application state
    let app_state = AppState {
        config: config.clone(),
        store: Arc::new(PgSyncStore::new(db_pool)),
        identity_verifier,
        stripe,
    };

    // Build the application
    let app = routes::create_routes()
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
        .fallback(handler_404);

    // Start the server
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await?;

    tracing::info!(
        "Webhook Sync Service listening on {}:{}",
        config.server.host,
        config.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}

async fn handler_404() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("Endpoint not found".to_string())),
    )
}
