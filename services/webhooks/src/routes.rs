use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Webhook endpoints (authenticated by signature, not by session)
        .route("/webhooks/identity", post(handlers::identity_webhook))
        .route("/webhooks/payments", post(handlers::payment_webhook))
}
