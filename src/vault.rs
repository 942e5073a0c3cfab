//! Persistence boundary.
//!
//! The durable engine itself is out of scope; what matters is the write
//! contract: a sink takes a signed record and answers accepted-or-rejected,
//! re-applying the odd-timestamp rule on its own side before insert.

use std::collections::VecDeque;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::models::{PersistenceOutcome, VaultRecord};

/// Rejection reason produced by the vault's own parity check.
pub const VAULT_REJECT_ODD: &str = "BLOCKCHAIN_REJECTION: Odd Timestamp Detected.";

/// Retention cap for the in-memory vault; oldest records are evicted first
/// once past it, so a long-running server stays bounded.
pub const MEMORY_VAULT_CAPACITY: usize = 10_000;

/// Write contract of the persistence boundary. Implementations provide
/// their own atomicity for concurrent writes.
#[async_trait]
pub trait VaultSink: Send + Sync {
    async fn store(&self, record: VaultRecord) -> Result<PersistenceOutcome>;
}

/// In-memory vault backing the ingestion endpoint (and tests). Retains at
/// most [`MEMORY_VAULT_CAPACITY`] records, FIFO eviction.
#[derive(Debug, Default)]
pub struct MemoryVault {
    records: Mutex<VecDeque<VaultRecord>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn records(&self) -> Vec<VaultRecord> {
        self.records.lock().iter().cloned().collect()
    }

    /// Synchronous insert path shared by the trait impl and the HTTP
    /// endpoint. The parity check runs here regardless of what the
    /// pipeline already validated.
    pub fn insert(&self, record: VaultRecord) -> PersistenceOutcome {
        if record.timestamp % 2 != 0 {
            return PersistenceOutcome::Rejected {
                reason: VAULT_REJECT_ODD.to_string(),
            };
        }
        let signature = record.signature.clone();
        let mut records = self.records.lock();
        records.push_back(record);
        if records.len() > MEMORY_VAULT_CAPACITY {
            records.pop_front();
        }
        PersistenceOutcome::Accepted { signature }
    }
}

#[async_trait]
impl VaultSink for MemoryVault {
    async fn store(&self, record: VaultRecord) -> Result<PersistenceOutcome> {
        Ok(self.insert(record))
    }
}

/// HTTP adapter for a remote vault (`POST {base}/api/record`). Any non-2xx
/// response is a rejection, per the boundary contract.
pub struct HttpVault {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpVault {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/record", base_url.trim_end_matches('/')),
        })
    }
}

#[derive(Deserialize)]
struct VaultAck {
    signature: String,
}

#[derive(Deserialize)]
struct VaultRejection {
    error: String,
}

#[async_trait]
impl VaultSink for HttpVault {
    async fn store(&self, record: VaultRecord) -> Result<PersistenceOutcome> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&record)
            .send()
            .await
            .context("vault request failed")?;

        let status = response.status();
        if status.is_success() {
            let ack: VaultAck = response
                .json()
                .await
                .context("vault ack was not valid JSON")?;
            Ok(PersistenceOutcome::Accepted {
                signature: ack.signature,
            })
        } else {
            let reason = response
                .json::<VaultRejection>()
                .await
                .map(|r| r.error)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            Ok(PersistenceOutcome::Rejected { reason })
        }
    }
}
