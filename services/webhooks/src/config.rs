use courseloom_common::{DatabaseConfig, ServerConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityWebhookConfig,
    pub stripe: StripeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityWebhookConfig {
    pub signing_secret: String,
    pub tolerance_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base: String,
    pub tolerance_secs: i64,
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            server: ServerConfig {
                host: std::env::var("WEBHOOKS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("WEBHOOKS_PORT")
                    .unwrap_or_else(|_| "8006".to_string())
                    .parse()
                    .unwrap_or(8006),
            },
            database: DatabaseConfig {
                host: std::env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: std::env::var("DATABASE_PORT")
                    .unwrap_or_else(|_| "5432".to_string())
                    .parse()
                    .unwrap_or(5432),
                username: std::env::var("DATABASE_USERNAME")
                    .unwrap_or_else(|_| "courseloom_user".to_string()),
                password: std::env::var("DATABASE_PASSWORD")
                    .unwrap_or_else(|_| "courseloom_password".to_string()),
                database: std::env::var("DATABASE_NAME")
                    .unwrap_or_else(|_| "courseloom".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            identity: IdentityWebhookConfig {
                signing_secret: std::env::var("IDENTITY_WEBHOOK_SECRET")
                    .unwrap_or_else(|_| "whsec_aWRlbnRpdHktd2ViaG9vay1kZXYtc2VjcmV0".to_string()),
                tolerance_secs: std::env::var("IDENTITY_WEBHOOK_TOLERANCE_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .unwrap_or(300),
            },
            stripe: StripeConfig {
                secret_key: std::env::var("STRIPE_SECRET_KEY")
                    .unwrap_or_else(|_| "sk_test_stripe_key".to_string()),
                webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET")
                    .unwrap_or_else(|_| "whsec_stripe_webhook_secret".to_string()),
                api_base: std::env::var("STRIPE_API_BASE")
                    .unwrap_or_else(|_| "https://api.stripe.com/v1".to_string()),
                tolerance_secs: std::env::var("STRIPE_WEBHOOK_TOLERANCE_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .unwrap_or(300),
            },
        })
    }
}
