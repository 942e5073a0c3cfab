//! Stream consumer: repairs the chaos feed and ships signed records to
//! the vault.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use tokio::time::{sleep, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::models::{PersistenceOutcome, VaultRecord};
use crate::pipeline::PipelineError;
use crate::session::{LineOutcome, Session};
use crate::vault::VaultSink;

pub struct StreamConsumer {
    stream_url: String,
    private_key: String,
    vault: Arc<dyn VaultSink>,
}

impl StreamConsumer {
    pub fn new(stream_url: String, private_key: String, vault: Arc<dyn VaultSink>) -> Self {
        Self {
            stream_url,
            private_key,
            vault,
        }
    }

    /// Run forever with exponential-backoff reconnect. Each connection is
    /// a fresh session, so the history window never survives a reconnect.
    pub async fn run(&self) -> Result<()> {
        let mut reconnect_delay = Duration::from_secs(1);
        let max_reconnect_delay = Duration::from_secs(60);

        loop {
            match self.connect_and_stream().await {
                Ok(_) => {
                    info!("stream closed gracefully");
                    reconnect_delay = Duration::from_secs(1);
                }
                Err(e) => {
                    error!("stream error: {}", e);
                    warn!("reconnecting in {:?}...", reconnect_delay);
                    sleep(reconnect_delay).await;
                    reconnect_delay = (reconnect_delay * 2).min(max_reconnect_delay);
                }
            }
        }
    }

    async fn connect_and_stream(&self) -> Result<()> {
        info!("🔌 connecting to chaos stream at {}", self.stream_url);
        let (ws_stream, response) = connect_async(self.stream_url.as_str())
            .await
            .context("Failed to connect to chaos stream")?;
        info!("✅ connected (status: {})", response.status());

        let mut session = Session::new(&self.private_key)?;
        let (_write, mut read) = ws_stream.split();

        while let Some(msg) = read.next().await {
            let msg = msg.context("stream read failed")?;
            let line = match msg {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            match session.handle_line(&line) {
                LineOutcome::Ignored => {}
                LineOutcome::Dropped(e) => debug!(error = %e, "line dropped"),
                LineOutcome::Signed(signed) => {
                    let record = VaultRecord::from(&signed);
                    match self.vault.store(record).await {
                        Ok(PersistenceOutcome::Accepted { signature }) => {
                            // ack comes from the remote vault: char-safe preview
                            let preview: String = signature.chars().take(10).collect();
                            debug!(signature = %preview, "record persisted");
                        }
                        Ok(PersistenceOutcome::Rejected { reason }) => {
                            let err = PipelineError::PersistenceRejected { reason };
                            warn!(error = %err, "record bounced at the boundary");
                        }
                        Err(e) => warn!(error = %e, "vault unreachable, record lost"),
                    }
                }
            }
        }

        let stats = session.stats();
        info!(
            accepted = stats.accepted,
            repaired = stats.repaired,
            rejected_odd = stats.rejected_odd,
            repair_failures = stats.repair_failures,
            "session ended"
        );
        Ok(())
    }
}
