//! Signing gate: HMAC-SHA256 over the canonical record payload.

use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::repair::RepairedRecord;
use super::validate::ValidatedRecord;

type HmacSha256 = Hmac<Sha256>;

/// A validated record plus its integrity signature (lowercase hex).
#[derive(Debug, Clone, PartialEq)]
pub struct SignedRecord {
    pub record: RepairedRecord,
    pub signature: String,
}

/// Holds the keyed MAC for the lifetime of a session. The secret is
/// absorbed once at construction and never leaves: `Debug` output and
/// logs only ever see the redaction marker.
#[derive(Clone)]
pub struct Signer {
    mac: HmacSha256,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").field("key", &"<redacted>").finish()
    }
}

impl Signer {
    pub fn new(secret: &str) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow!("HMAC key error: {}", e))?;
        Ok(Self { mac })
    }

    /// Sign the canonical `"{timestamp}:{price}:{hash}"` payload.
    /// Identical inputs under the same key always yield identical hex.
    pub fn sign(&self, validated: ValidatedRecord) -> SignedRecord {
        let record = validated.record;
        let payload = format!(
            "{}:{}:{}",
            record.timestamp, record.price, record.integrity_hash
        );

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        SignedRecord { record, signature }
    }
}
