// ============================
// sledrun-backend-lib/src/lib.rs
// ============================
//! Room coordination server for Sled Run: room store, WebSocket session
//! gateway and the cosmetics catalog.

pub mod catalog;
pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod room;
pub mod validation;
pub mod websocket;
pub mod ws_router;

use std::sync::Arc;

use crate::clients::ClientRegistry;
use crate::config::Settings;
use crate::room::RoomStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Every active room
    pub rooms: Arc<RoomStore>,
    /// Outbound queues of open connections
    pub clients: Arc<ClientRegistry>,
    /// Settings the server was started with
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state
    pub fn new(settings: Settings) -> Self {
        Self {
            rooms: Arc::new(RoomStore::new(settings.rooms)),
            clients: Arc::new(ClientRegistry::new()),
            settings: Arc::new(settings),
        }
    }
}
