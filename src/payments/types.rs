//! Authorization payloads.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::bank::AuthStatus;

/// Incoming authorization request. Every field is optional on the wire;
/// nothing here is validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizeRequest {
    pub card_number: String,
    pub amount: f64,
    pub currency: String,
    pub merchant: String,
    pub processor: String,
}

impl AuthorizeRequest {
    /// Processor label, or `"unknown"` when the request left it empty.
    pub fn processor_label(&self) -> &str {
        if self.processor.is_empty() {
            "unknown"
        } else {
            &self.processor
        }
    }
}

/// Result of a handled authorization (approved or declined).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub transaction_id: String,
    pub status: AuthStatus,
    pub processor: String,
    pub amount: f64,
    pub latency_ms: u64,
    pub version: String,
}

/// Generate a transaction id of the form `txn-<unix nanos>-<0000..9999>`.
///
/// Unique enough for log correlation; collisions are possible.
pub fn new_transaction_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("txn-{}-{:04}", nanos, suffix)
}
