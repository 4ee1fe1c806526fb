// ==================
// crates/backend-lib/src/websocket.rs
// ==================
//! WebSocket Handler Module
//!
//! One `WebSocketHandler` lives per connection. It owns the connection id and
//! the set of rooms that connection has joined, turns each inbound frame into
//! room store operations, and fans the resulting events out through the
//! shared [`ClientRegistry`](crate::clients::ClientRegistry).
//!
//! Replies meant only for the sender and relays to other members both go
//! through the registry, so every outbound frame for a connection shares one
//! ordered queue.

use std::collections::BTreeSet;
use std::sync::Arc;

use metrics::counter;
use sledrun_common::{
    ClientId, ClientMessage, CosmeticsPatch, GameMode, RoomCode, RoomOptions, ServerMessage,
    HUB_CODE,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::clients::Delivery;
use crate::error::AppError;
use crate::metrics as keys;
use crate::room::{Departure, RoomError};
use crate::validation;
use crate::AppState;

/// Per-connection message handler
pub struct WebSocketHandler {
    state: Arc<AppState>,
    client_id: ClientId,
    joined_rooms: BTreeSet<RoomCode>,
}

impl WebSocketHandler {
    pub fn new(state: Arc<AppState>, client_id: ClientId) -> Self {
        Self {
            state,
            client_id,
            joined_rooms: BTreeSet::new(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Rooms this connection currently belongs to
    pub fn joined_rooms(&self) -> &BTreeSet<RoomCode> {
        &self.joined_rooms
    }

    /// Attach the outbound queue and greet the client with its id
    pub fn register(&self, tx: mpsc::Sender<ServerMessage>) {
        self.state.clients.register(&self.client_id, tx);
        self.reply(ServerMessage::Connected {
            id: self.client_id.clone(),
        });
    }

    /// Parse, validate and dispatch one text frame
    ///
    /// # Errors
    /// Malformed JSON or a message that fails validation. Nothing has been
    /// changed in the room store when an error is returned.
    pub fn handle_text(&mut self, text: &str) -> Result<(), AppError> {
        let msg: ClientMessage = serde_json::from_str(text)?;
        let msg = validation::validate_client_message(msg)?;
        self.handle_message(msg);
        Ok(())
    }

    /// Send an error frame describing `err` to this connection
    pub fn report_error(&self, err: &AppError) {
        counter!(keys::WS_MALFORMED).increment(1);
        warn!(client = %self.client_id, error = %err, "rejected client frame");
        self.reply(ServerMessage::Error {
            code: err.error_code().to_string(),
            message: err.sanitized_message(),
        });
    }

    /// Apply an already-validated message
    pub fn handle_message(&mut self, msg: ClientMessage) {
        match msg {
            ClientMessage::CreateRoom {
                mode,
                name,
                is_solo,
            } => self.create_room(mode, name.as_deref(), is_solo),
            ClientMessage::JoinRoom { code, name } => self.join_room(&code, name.as_deref()),
            ClientMessage::UpdateCosmetics { code, cosmetics } => {
                self.update_cosmetics(&code, &cosmetics);
            },
            ClientMessage::StartGame { code } => self.start_game(&code),
            ClientMessage::PlayerState { code, state } => {
                if !self.state.rooms.record_player_state(&code, &self.client_id, state.clone()) {
                    return;
                }
                let update = ServerMessage::PlayerStateUpdate {
                    id: self.client_id.clone(),
                    state,
                };
                let members = self.state.rooms.member_ids(&code);
                self.state.clients.broadcast(
                    &members,
                    &update,
                    Some(self.client_id.as_str()),
                    Delivery::BestEffort,
                );
            },
            ClientMessage::PlayerFinished { code, time, score } => {
                if !self.state.rooms.is_member(&code, &self.client_id) {
                    return;
                }
                debug!(client = %self.client_id, code = %code, "player finished");
                self.broadcast_room(
                    &code,
                    &ServerMessage::PlayerFinished {
                        id: self.client_id.clone(),
                        time,
                        score,
                    },
                );
            },
            ClientMessage::ChatMessage { code, message } => {
                if code != HUB_CODE || !self.state.rooms.is_member(&code, &self.client_id) {
                    debug!(client = %self.client_id, code = %code, "chat outside the hub ignored");
                    return;
                }
                self.broadcast_room(
                    &code,
                    &ServerMessage::ChatMessage {
                        id: self.client_id.clone(),
                        message,
                    },
                );
            },
            ClientMessage::LeaveRoom { code } => self.leave_room(&code),
        }
    }

    fn create_room(&mut self, mode: GameMode, name: Option<&str>, is_solo: bool) {
        let limits = self.state.rooms.limits();
        let (options, reserved) = if mode == GameMode::Hub {
            let options = RoomOptions {
                max_players: limits.hub_max_players,
                is_solo: false,
            };
            (options, Some(HUB_CODE))
        } else {
            let options = RoomOptions {
                max_players: limits.default_max_players,
                is_solo,
            };
            (options, None)
        };

        let joined = self
            .state
            .rooms
            .create_room(&self.client_id, mode, options, reserved)
            .and_then(|room| self.state.rooms.join_room(&room.code, &self.client_id, name));
        match joined {
            Ok(room) => {
                self.joined_rooms.insert(room.code.clone());
                info!(client = %self.client_id, code = %room.code, ?mode, "room created");
                self.reply(ServerMessage::RoomCreated(room));
            },
            Err(err) => self.reply(ServerMessage::RoomError(err.to_string())),
        }
    }

    fn join_room(&mut self, code: &str, name: Option<&str>) {
        match self.state.rooms.join_room(code, &self.client_id, name) {
            Ok(room) => {
                self.joined_rooms.insert(room.code.clone());
                info!(client = %self.client_id, code, players = room.players.len(), "player joined");
                self.broadcast_room(code, &ServerMessage::PlayerJoined(room.players.clone()));
                self.reply(ServerMessage::RoomJoined(room));
            },
            Err(err) => {
                debug!(client = %self.client_id, code, %err, "join refused");
                self.reply(ServerMessage::RoomError(err.to_string()));
            },
        }
    }

    fn update_cosmetics(&self, code: &str, patch: &CosmeticsPatch) {
        let Some(player) = self
            .state
            .rooms
            .update_player_cosmetics(code, &self.client_id, patch)
        else {
            return;
        };
        self.broadcast_room(
            code,
            &ServerMessage::PlayerUpdated {
                id: player.id,
                cosmetics: player.cosmetics,
            },
        );
    }

    fn start_game(&self, code: &str) {
        match self.state.rooms.mark_started(code, &self.client_id) {
            Ok(room) => {
                info!(code, seed = room.seed, players = room.players.len(), "game started");
                let started = ServerMessage::GameStarted {
                    seed: room.seed,
                    players: room.players,
                    mode: room.mode,
                };
                self.broadcast_room(code, &started);
            },
            Err(RoomError::NotHost) => {
                warn!(client = %self.client_id, code, "non-host tried to start the game");
            },
            Err(err) => debug!(client = %self.client_id, code, %err, "start ignored"),
        }
    }

    fn leave_room(&mut self, code: &str) {
        self.joined_rooms.remove(code);
        match self.state.rooms.leave_room(code, &self.client_id) {
            Some(Departure::Remaining(room)) => {
                info!(client = %self.client_id, code, "player left");
                let survivors: Vec<ClientId> = room.players.keys().cloned().collect();
                let left = ServerMessage::PlayerLeft {
                    id: self.client_id.clone(),
                    host_id: room.host_id,
                    players: room.players,
                };
                self.state
                    .clients
                    .broadcast(&survivors, &left, None, Delivery::Reliable);
            },
            Some(Departure::Closed) => {
                info!(client = %self.client_id, code, "last player left");
            },
            None => {},
        }
    }

    /// Leave every joined room and drop the outbound queue
    pub fn disconnect(&mut self) {
        let rooms = std::mem::take(&mut self.joined_rooms);
        for code in &rooms {
            self.leave_room(code);
        }
        self.state.clients.unregister(&self.client_id);
        info!(client = %self.client_id, rooms = rooms.len(), "client disconnected");
    }

    fn reply(&self, msg: ServerMessage) {
        self.state.clients.send_to(&self.client_id, msg);
    }

    fn broadcast_room(&self, code: &str, msg: &ServerMessage) {
        let members = self.state.rooms.member_ids(code);
        self.state
            .clients
            .broadcast(&members, msg, None, Delivery::Reliable);
    }
}
