// ============================
// crates/backend-lib/src/handlers/http.rs
// ============================
//! Cosmetics catalog and health endpoints.
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use sledrun_common::CatalogResponse;
use tracing::debug;

use crate::catalog;
use crate::AppState;

/// `GET /api/cosmetics/{category}`; unknown categories list no items
pub async fn cosmetics_handler(Path(category): Path<String>) -> Json<CatalogResponse> {
    let items = catalog::items_for(&category);
    if items.is_empty() {
        debug!(category = %category, "unknown cosmetics category");
    }
    Json(CatalogResponse { items })
}

/// Body of `GET /health`
#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub rooms: usize,
    pub clients: usize,
}

/// `GET /health`
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        rooms: state.rooms.room_count(),
        clients: state.clients.len(),
    })
}
