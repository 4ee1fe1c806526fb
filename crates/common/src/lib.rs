// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between the Sled Run client and server.
//! This module defines the WebSocket protocol messages and the room,
//! player and cosmetics types carried inside them.
//!
//! Every frame is a JSON object of the form
//! `{"type": "<camelCaseName>", "payload": ...}`.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Connection identifier, stable for the lifetime of one WebSocket
pub type ClientId = String;

/// Short room identifier (4 uppercase hex characters, or [`HUB_CODE`])
pub type RoomCode = String;

/// Room members keyed by connection id, in join order
pub type PlayerMap = IndexMap<ClientId, Player>;

/// Reserved code of the persistent, always-joinable social hub
pub const HUB_CODE: &str = "VILLAGE";

/// Game mode chosen when a room is created
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Point-to-point race
    #[default]
    Race,
    /// Endless survival in front of an avalanche
    Endless,
    /// Non-competitive social room
    Hub,
}

/// The cosmetic triple worn by a player
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Cosmetics {
    pub character: String,
    pub sled: String,
    pub hat: String,
}

impl Default for Cosmetics {
    fn default() -> Self {
        Self {
            character: "🏂".to_string(),
            sled: "🛷".to_string(),
            hat: "🧢".to_string(),
        }
    }
}

impl Cosmetics {
    /// Shallow-merge a partial update; fields absent from `patch` are untouched.
    pub fn apply(&mut self, patch: &CosmeticsPatch) {
        if let Some(character) = &patch.character {
            self.character.clone_from(character);
        }
        if let Some(sled) = &patch.sled {
            self.sled.clone_from(sled);
        }
        if let Some(hat) = &patch.hat {
            self.hat.clone_from(hat);
        }
    }
}

/// Partial cosmetics update sent by a client
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CosmeticsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sled: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hat: Option<String>,
}

impl CosmeticsPatch {
    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.character.is_none() && self.sled.is_none() && self.hat.is_none()
    }
}

/// A member of one room
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: ClientId,
    pub name: String,
    pub is_host: bool,
    pub cosmetics: Cosmetics,
    /// Last relayed position snapshot; opaque to the server
    #[serde(default)]
    pub state: Value,
}

/// Per-room limits fixed at creation
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomOptions {
    pub max_players: usize,
    pub is_solo: bool,
}

impl Default for RoomOptions {
    fn default() -> Self {
        Self {
            max_players: 8,
            is_solo: false,
        }
    }
}

/// An isolated multiplayer session
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub code: RoomCode,
    pub mode: GameMode,
    pub host_id: ClientId,
    pub started: bool,
    /// Terrain seed shared by every client in the room
    pub seed: u32,
    pub players: PlayerMap,
    pub options: RoomOptions,
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Whether this is the persistent social hub
    pub fn is_hub(&self) -> bool {
        self.code == HUB_CODE
    }
}

/// Messages sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Create a room and join it as host
    #[serde(rename_all = "camelCase")]
    CreateRoom {
        #[serde(default)]
        mode: GameMode,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        is_solo: bool,
    },
    /// Join an existing room (or the hub)
    JoinRoom {
        code: RoomCode,
        #[serde(default)]
        name: Option<String>,
    },
    /// Change some of the sender's cosmetics
    UpdateCosmetics {
        code: RoomCode,
        cosmetics: CosmeticsPatch,
    },
    /// Host-only: start the game
    StartGame { code: RoomCode },
    /// Position snapshot, relayed to everyone else in the room
    PlayerState { code: RoomCode, state: Value },
    /// The sender crossed the finish line or was caught; `time` and `score`
    /// are relayed as sent, absent ones as `null`
    PlayerFinished {
        code: RoomCode,
        #[serde(default)]
        time: Value,
        #[serde(default)]
        score: Value,
    },
    /// Hub chat line
    ChatMessage { code: RoomCode, message: String },
    /// Leave a room without closing the connection
    LeaveRoom { code: RoomCode },
}

impl ClientMessage {
    /// Room code the message targets, if any
    pub fn room_code(&self) -> Option<&str> {
        match self {
            ClientMessage::CreateRoom { .. } => None,
            ClientMessage::JoinRoom { code, .. }
            | ClientMessage::UpdateCosmetics { code, .. }
            | ClientMessage::StartGame { code }
            | ClientMessage::PlayerState { code, .. }
            | ClientMessage::PlayerFinished { code, .. }
            | ClientMessage::ChatMessage { code, .. }
            | ClientMessage::LeaveRoom { code } => Some(code),
        }
    }
}

/// Messages sent from server to client(s)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ServerMessage {
    /// First frame on every connection: the id the server assigned
    Connected { id: ClientId },
    /// Reply to `createRoom`
    RoomCreated(Room),
    /// Reply to a successful `joinRoom`
    RoomJoined(Room),
    /// Reply to a failed `joinRoom`, carrying the reason
    RoomError(String),
    /// Full membership after someone joined
    PlayerJoined(PlayerMap),
    /// A player's cosmetics changed
    PlayerUpdated { id: ClientId, cosmetics: Cosmetics },
    /// A player left or disconnected
    #[serde(rename_all = "camelCase")]
    PlayerLeft {
        id: ClientId,
        host_id: ClientId,
        players: PlayerMap,
    },
    /// The host started the game
    GameStarted {
        seed: u32,
        players: PlayerMap,
        mode: GameMode,
    },
    /// Relayed position snapshot of another player
    PlayerStateUpdate { id: ClientId, state: Value },
    /// A player finished
    PlayerFinished {
        id: ClientId,
        #[serde(default)]
        time: Value,
        #[serde(default)]
        score: Value,
    },
    /// Hub chat line
    ChatMessage { id: ClientId, message: String },
    /// Protocol-level error (malformed or invalid frame)
    Error { code: String, message: String },
}

/// Cosmetics categories served by the catalog
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CosmeticCategory {
    Characters,
    Sleds,
    Hats,
}

impl CosmeticCategory {
    pub const ALL: [CosmeticCategory; 3] = [Self::Characters, Self::Sleds, Self::Hats];

    /// URL segment naming this category
    pub fn as_str(self) -> &'static str {
        match self {
            CosmeticCategory::Characters => "characters",
            CosmeticCategory::Sleds => "sleds",
            CosmeticCategory::Hats => "hats",
        }
    }

    /// Parse a URL segment; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

/// One selectable cosmetic as served to clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CosmeticItem {
    pub id: String,
    pub name: String,
    /// Always `null`: cosmetics are symbols rendered by the client
    pub url: Option<String>,
}

/// Body of `GET /api/cosmetics/{category}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogResponse {
    pub items: Vec<CosmeticItem>,
}
