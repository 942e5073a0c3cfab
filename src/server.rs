//! Chaos stream server and vault ingestion endpoint.
//!
//! `GET /` upgrades to a WebSocket carrying one independent corrupted
//! telemetry stream per connection. `POST /api/record` is the ingestion
//! port: it re-checks timestamp parity and stores the record.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::interval;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::chaos::{ChaosGenerator, HANDSHAKE};
use crate::models::{PersistenceOutcome, VaultRecord};
use crate::vault::MemoryVault;

#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<MemoryVault>,
    pub tick: Duration,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(chaos_stream_handler))
        .route("/api/record", post(record_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("🌀 entropy engine listening on port {}", port);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn chaos_stream_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| run_chaos_stream(socket, state))
}

/// One corrupted stream per connection: handshake first, then one line per
/// tick until the client goes away.
async fn run_chaos_stream(mut socket: WebSocket, state: AppState) {
    info!("client connected, initiating chaos stream");

    if socket.send(Message::Text(HANDSHAKE.to_string())).await.is_err() {
        return;
    }

    let mut generator = ChaosGenerator::new();
    let mut ticker = interval(state.tick);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let line = generator.next_line();
                if socket.send(Message::Text(line)).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    info!("client disconnected");
}

/// Ingestion port. The parity rule runs again here, independent of the
/// consumer-side validation gate.
async fn record_handler(
    State(state): State<AppState>,
    Json(record): Json<VaultRecord>,
) -> (StatusCode, Json<Value>) {
    match state.vault.insert(record) {
        PersistenceOutcome::Accepted { signature } => {
            // client-supplied string: char-safe preview, never byte-sliced
            let preview: String = signature.chars().take(10).collect();
            info!("🔗 signed & saved: {}...", preview);
            (
                StatusCode::CREATED,
                Json(json!({ "success": true, "signature": signature })),
            )
        }
        PersistenceOutcome::Rejected { reason } => {
            warn!(reason = %reason, "vault rejected record");
            (StatusCode::BAD_REQUEST, Json(json!({ "error": reason })))
        }
    }
}
