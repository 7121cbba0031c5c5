use crate::hub::Hub;
use crate::types::{ClientMessage, ServerMessage};
use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use soma_core::config::GatewayConfig;
use soma_reasoning::Snapshot;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tower_http::cors::CorsLayer;

/// Shared state for the route handlers.
#[derive(Clone)]
struct AppState {
    hub: Arc<Hub>,
    /// Input lines into the simulation loop
    input_tx: mpsc::Sender<String>,
    snapshots: watch::Receiver<Snapshot>,
    active_ws: Arc<AtomicUsize>,
}

/// The gateway HTTP + WebSocket server.
///
/// - `GET /ws`: output frames out, client messages in
/// - `GET /state`: latest snapshot as JSON
/// - `GET /health`: health check
pub struct GatewayServer {
    hub: Arc<Hub>,
    input_tx: mpsc::Sender<String>,
    snapshots: watch::Receiver<Snapshot>,
    active_ws: Arc<AtomicUsize>,
    host: String,
    port: u16,
    /// How often state frames are pushed to listeners
    state_interval: Duration,
}

impl GatewayServer {
    pub fn new(
        config: &GatewayConfig,
        hub: Arc<Hub>,
        input_tx: mpsc::Sender<String>,
        snapshots: watch::Receiver<Snapshot>,
    ) -> Self {
        Self {
            hub,
            input_tx,
            snapshots,
            active_ws: Arc::new(AtomicUsize::new(0)),
            host: config.host.clone(),
            port: config.port,
            state_interval: Duration::from_secs(1),
        }
    }

    /// Number of active WebSocket connections.
    pub fn active_connections(&self) -> Arc<AtomicUsize> {
        self.active_ws.clone()
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            hub: self.hub.clone(),
            input_tx: self.input_tx.clone(),
            snapshots: self.snapshots.clone(),
            active_ws: self.active_ws.clone(),
        };
        Router::new()
            .route("/health", get(health))
            .route("/state", get(current_state))
            .route("/ws", get(ws_upgrade))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Serve on an already bound listener until the process ends.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let app = self.router();
        tokio::spawn(push_state(self.hub.clone(), self.snapshots.clone(), self.state_interval));
        axum::serve(listener, app).await.context("Gateway server error")
    }

    /// Bind and serve in a background task.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        let addr = format!("{}:{}", self.host, self.port);
        tokio::spawn(async move {
            let listener = match TcpListener::bind(&addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!("Gateway failed to bind {}: {}", addr, e);
                    return;
                }
            };
            tracing::info!("Gateway listening on {}", addr);
            if let Err(e) = self.serve(listener).await {
                tracing::error!("{:#}", e);
            }
        })
    }
}

/// Push state frames whenever the snapshot has moved on and someone listens.
async fn push_state(hub: Arc<Hub>, mut snapshots: watch::Receiver<Snapshot>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        match snapshots.has_changed() {
            Ok(true) if hub.listener_count() > 0 => {
                let snapshot = snapshots.borrow_and_update().clone();
                for frame in ServerMessage::state_frames(&snapshot) {
                    hub.broadcast(&frame);
                }
            }
            Ok(_) => {}
            Err(_) => {
                tracing::debug!("Snapshot sender dropped, state push stopped");
                return;
            }
        }
    }
}

// ============================================================================
// Route handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

async fn current_state(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.snapshots.borrow().clone())
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Forward a client message into the simulation.
fn accept_client_text(state: &AppState, text: &str) -> Result<(), String> {
    let msg: ClientMessage = serde_json::from_str(text).map_err(|e| format!("Invalid JSON: {}", e))?;
    msg.validate().map_err(|e| e.to_string())?;
    match state.input_tx.try_send(msg.to_input_line()) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(_)) => Err("input queue full, try again".to_string()),
        Err(TrySendError::Closed(_)) => Err("simulation stopped".to_string()),
    }
}

/// One WebSocket connection: current state on connect, then every hub frame
/// out and client messages in.
async fn handle_ws(socket: WebSocket, state: AppState) {
    state.active_ws.fetch_add(1, Ordering::Relaxed);
    let (id, mut outbound) = state.hub.subscribe();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let snapshot = state.snapshots.borrow().clone();
    for frame in ServerMessage::state_frames(&snapshot) {
        let json = serde_json::to_string(&frame).unwrap_or_default();
        if ws_tx.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                let json = serde_json::to_string(&frame).unwrap_or_default();
                if ws_tx.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            inbound = ws_rx.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if let Err(reason) = accept_client_text(&state, &text) {
                        tracing::debug!("Rejected client message: {}", reason);
                        let err = serde_json::json!({ "error": reason });
                        if ws_tx.send(Message::Text(err.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.hub.unsubscribe(id);
    state.active_ws.fetch_sub(1, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use soma_core::BiologicalState;
    use soma_psyche::PsychologicalState;

    fn app_state(capacity: usize) -> (AppState, mpsc::Receiver<String>) {
        let (input_tx, input_rx) = mpsc::channel(capacity);
        let (_tx, snapshots) = watch::channel(Snapshot {
            bio: BiologicalState::default(),
            psych: PsychologicalState::default(),
            sim_time: Utc::now(),
            paused: false,
        });
        let state = AppState {
            hub: Arc::new(Hub::new(4)),
            input_tx,
            snapshots,
            active_ws: Arc::new(AtomicUsize::new(0)),
        };
        (state, input_rx)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn test_client_text_becomes_input_line() {
        let (state, mut rx) = app_state(4);
        accept_client_text(&state, r#"{"type":"action","content":"opens the window"}"#).unwrap();
        assert_eq!(rx.recv().await.unwrap(), "*opens the window*");
    }

    #[tokio::test]
    async fn test_client_text_errors() {
        let (state, _rx) = app_state(1);
        assert!(accept_client_text(&state, "not json").unwrap_err().starts_with("Invalid JSON"));
        assert!(accept_client_text(&state, r#"{"type":"yell","content":"x"}"#)
            .unwrap_err()
            .contains("unknown message type"));

        accept_client_text(&state, r#"{"type":"speech","content":"one"}"#).unwrap();
        assert_eq!(
            accept_client_text(&state, r#"{"type":"speech","content":"two"}"#).unwrap_err(),
            "input queue full, try again"
        );
    }

    #[tokio::test]
    async fn test_gateway_server_creates() {
        let (state, _rx) = app_state(4);
        let server = GatewayServer::new(&GatewayConfig::default(), state.hub, state.input_tx, state.snapshots);
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 7878);
        assert_eq!(server.active_connections().load(Ordering::Relaxed), 0);
    }
}
