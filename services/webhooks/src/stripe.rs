use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;

use courseloom_common::AppError;

use crate::config::StripeConfig;
use crate::models::CheckoutSession;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

// Client for the payment provider: webhook signature verification plus
// the session-list lookup the payment-intent events need.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

#[derive(Debug, Deserialize)]
struct SessionList {
    data: Vec<CheckoutSession>,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: Client::new(),
            config: config.clone(),
        }
    }

    fn auth_header(&self) -> String {
        let credentials = format!("{}:", self.config.secret_key);
        let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
        format!("Basic {encoded}")
    }

    // The provider signs "{t}.{body}" and sends the result hex-encoded in
    // a header of comma-separated k=v pairs: t=<unix ts>,v1=<hex>[,v1=...].
    pub fn verify_signature(&self, payload: &[u8], header: &str) -> Result<(), AppError> {
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = Some(value),
                Some(("v1", value)) => signatures.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            AppError::SignatureVerification("signature header is missing timestamp".to_string())
        })?;

        if signatures.is_empty() {
            return Err(AppError::SignatureVerification(
                "signature header carries no v1 signature".to_string(),
            ));
        }

        let ts: i64 = timestamp.parse().map_err(|_| {
            AppError::SignatureVerification("signature timestamp is not a unix timestamp".to_string())
        })?;

        let now = Utc::now().timestamp();
        if (now - ts).abs() > self.config.tolerance_secs {
            return Err(AppError::SignatureVerification(
                "timestamp outside of tolerance".to_string(),
            ));
        }

        let expected = self.sign(timestamp, payload)?;
        if signatures.iter().any(|signature| *signature == expected) {
            Ok(())
        } else {
            Err(AppError::SignatureVerification(
                "no matching signature found".to_string(),
            ))
        }
    }

    pub fn sign(&self, timestamp: &str, payload: &[u8]) -> Result<String, AppError> {
        let mut mac = HmacSha256::new_from_slice(self.config.webhook_secret.as_bytes())
            .map_err(|_| {
                AppError::SignatureVerification("webhook secret has invalid length".to_string())
            })?;

        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    // Payment-intent events do not carry the purchase id; the checkout
    // session that created the intent does, in its metadata.
    pub async fn checkout_session_for_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<CheckoutSession>, AppError> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions", self.config.api_base))
            .header("Authorization", self.auth_header())
            .query(&[("payment_intent", payment_intent_id), ("limit", "1")])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("session lookup failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "session lookup returned {status}: {body}"
            )));
        }

        let list: SessionList = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("invalid session list payload: {e}")))?;

        Ok(list.data.into_iter().next())
    }
}
