use serde::{Deserialize, Serialize};

use crate::pipeline::SignedRecord;

/// Insecure fallback used only when PRIVATE_KEY is unset. Fine for local
/// runs, never for production; `main` warns loudly when it is in effect.
pub const DEV_PRIVATE_KEY: &str = "dev-secret-not-for-production";

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub private_key: String,
    pub tick_ms: u64,
    pub stream_url: String,
    pub vault_url: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("private_key", &"<redacted>")
            .field("tick_ms", &self.tick_ms)
            .field("stream_url", &self.stream_url)
            .field("vault_url", &self.vault_url)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "4000".to_string())
            .parse()
            .unwrap_or(4000);

        let private_key =
            std::env::var("PRIVATE_KEY").unwrap_or_else(|_| DEV_PRIVATE_KEY.to_string());

        let tick_ms = std::env::var("CHAOS_TICK_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .unwrap_or(1000);

        let stream_url =
            std::env::var("STREAM_URL").unwrap_or_else(|_| "ws://localhost:4000/".to_string());

        let vault_url =
            std::env::var("VAULT_URL").unwrap_or_else(|_| "http://localhost:4000".to_string());

        Ok(Self {
            port,
            private_key,
            tick_ms,
            stream_url,
            vault_url,
        })
    }
}

/// Wire shape accepted by the vault ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRecord {
    pub timestamp: i64,
    pub price: f64,
    pub hash: String,
    pub is_repaired: bool,
    pub signature: String,
}

impl From<&SignedRecord> for VaultRecord {
    fn from(signed: &SignedRecord) -> Self {
        Self {
            timestamp: signed.record.timestamp,
            price: signed.record.price,
            hash: signed.record.integrity_hash.clone(),
            is_repaired: signed.record.was_repaired,
            signature: signed.signature.clone(),
        }
    }
}

/// Result of handing a signed record to the persistence boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PersistenceOutcome {
    Accepted { signature: String },
    Rejected { reason: String },
}
