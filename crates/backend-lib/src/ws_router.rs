// ============================
// sledrun-backend-lib/src/ws_router.rs
// ============================
//! HTTP router and WebSocket connection handling.
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use sledrun_common::ServerMessage;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::http::{cosmetics_handler, health_handler};
use crate::metrics as keys;
use crate::websocket::WebSocketHandler;
use crate::AppState;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/cosmetics/{category}", get(cosmetics_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Handler for WebSocket connections
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    counter!(keys::WS_CONNECTION).increment(1);
    let client_id = Uuid::new_v4().to_string();
    ws.on_upgrade(move |socket| handle_connection(socket, state, client_id))
}

#[instrument(name = "connection", skip(socket, state))]
async fn handle_connection(socket: WebSocket, state: Arc<AppState>, client_id: String) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(state.settings.client_channel_capacity);

    let mut handler = WebSocketHandler::new(Arc::clone(&state), client_id);
    handler.register(tx);
    gauge!(keys::WS_ACTIVE).set(state.clients.len() as f64);
    info!("client connected");

    // Drain the outbound queue into the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!(error = %e, "failed to serialize server message");
                    continue;
                },
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "websocket read failed");
                break;
            },
        };
        match frame {
            Message::Text(text) => {
                if let Err(err) = handler.handle_text(text.as_str()) {
                    handler.report_error(&err);
                }
            },
            Message::Binary(_) => {
                handler.report_error(&AppError::UnsupportedFrame("binary".to_string()));
            },
            Message::Close(_) => break,
            // Ping/pong are answered by axum
            Message::Ping(_) | Message::Pong(_) => {},
        }
    }

    handler.disconnect();
    counter!(keys::WS_DISCONNECTION).increment(1);
    gauge!(keys::WS_ACTIVE).set(state.clients.len() as f64);

    send_task.abort();
}
