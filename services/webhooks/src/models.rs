use std::collections::HashMap;

use serde::Deserialize;

// Identity provider events

// Event types this service does not handle can carry arbitrary payloads,
// so the envelope keeps the data untyped; each dispatch arm parses the
// shape it needs.
#[derive(Debug, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
}

// User payload carried by identity lifecycle events. Deletion events only
// carry the subject id, so everything else is optional.
#[derive(Debug, Deserialize)]
pub struct IdentityUserData {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

impl IdentityUserData {
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses
            .first()
            .map(|entry| entry.email_address.as_str())
    }

    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{first} {last}").trim().to_string()
    }
}

// Payment provider events

#[derive(Debug, Deserialize)]
pub struct PaymentEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub created: i64,
    pub data: PaymentEventData,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
}
