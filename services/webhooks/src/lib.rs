pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod store;
pub mod stripe;
pub mod verify;

use std::sync::Arc;

use crate::config::SyncConfig;
use crate::store::SyncStore;
use crate::stripe::StripeClient;
use crate::verify::IdentityWebhookVerifier;

#[derive(Clone)]
pub struct AppState {
    pub config: SyncConfig,
    pub store: Arc<dyn SyncStore>,
    pub identity_verifier: IdentityWebhookVerifier,
    pub stripe: StripeClient,
}
