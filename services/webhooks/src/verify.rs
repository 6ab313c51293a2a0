use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use courseloom_common::AppError;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

// Verifier for identity provider webhooks. The provider signs
// "{id}.{timestamp}.{body}" with an HMAC-SHA256 key delivered as a
// base64 string, optionally carrying a "whsec_" prefix.
#[derive(Clone)]
pub struct IdentityWebhookVerifier {
    key: Vec<u8>,
    tolerance_secs: i64,
}

impl IdentityWebhookVerifier {
    pub fn new(secret: &str, tolerance_secs: i64) -> Result<Self, AppError> {
        let encoded = secret.strip_prefix("whsec_").unwrap_or(secret);
        let key = general_purpose::STANDARD.decode(encoded).map_err(|_| {
            AppError::SignatureVerification("webhook secret is not valid base64".to_string())
        })?;

        Ok(Self {
            key,
            tolerance_secs,
        })
    }

    pub fn verify(
        &self,
        msg_id: &str,
        timestamp: &str,
        signature_header: &str,
        payload: &[u8],
    ) -> Result<(), AppError> {
        let ts: i64 = timestamp.parse().map_err(|_| {
            AppError::SignatureVerification("timestamp header is not a unix timestamp".to_string())
        })?;

        let now = Utc::now().timestamp();
        if (now - ts).abs() > self.tolerance_secs {
            return Err(AppError::SignatureVerification(
                "timestamp outside of tolerance".to_string(),
            ));
        }

        let expected = self.sign(msg_id, timestamp, payload)?;

        // The header may carry several space-separated signatures, each
        // prefixed with its scheme version.
        for entry in signature_header.split_whitespace() {
            if let Some(signature) = entry.strip_prefix("v1,") {
                if signature == expected {
                    return Ok(());
                }
            }
        }

        Err(AppError::SignatureVerification(
            "no matching signature found".to_string(),
        ))
    }

    pub fn sign(&self, msg_id: &str, timestamp: &str, payload: &[u8]) -> Result<String, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| {
            AppError::SignatureVerification("webhook secret has invalid length".to_string())
        })?;

        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }
}
