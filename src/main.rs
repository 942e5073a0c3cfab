//! entropyd - corrupted telemetry stream, repair pipeline and vault,
//! one binary.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use entropy_engine::{
    consumer::StreamConsumer,
    models::{Config, DEV_PRIVATE_KEY},
    server::{serve, AppState},
    vault::{HttpVault, MemoryVault},
};

#[derive(Parser)]
#[command(name = "entropyd", about = "Corruption-tolerant telemetry repair engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the chaos stream server and vault ingestion endpoint
    Serve,
    /// Consume a chaos stream, repair it and ship signed records to the vault
    Consume,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing();

    if config.private_key == DEV_PRIVATE_KEY {
        warn!("PRIVATE_KEY not set, using the insecure dev default");
    }

    let cli = Cli::parse();
    match cli.command {
        Command::Serve => {
            info!("🌀 entropy engine starting in server mode");
            let state = AppState {
                vault: Arc::new(MemoryVault::new()),
                tick: Duration::from_millis(config.tick_ms),
            };
            serve(state, config.port).await
        }
        Command::Consume => {
            info!("🛠️ entropy engine starting in consumer mode");
            let vault = Arc::new(HttpVault::new(&config.vault_url)?);
            let consumer =
                StreamConsumer::new(config.stream_url.clone(), config.private_key.clone(), vault);
            consumer.run().await
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "entropy_engine=debug,entropyd=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
