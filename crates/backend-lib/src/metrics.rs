// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const WS_CONNECTION: &str = "ws.connection";
pub const WS_DISCONNECTION: &str = "ws.disconnection";
pub const WS_ACTIVE: &str = "ws.active";
pub const WS_MALFORMED: &str = "ws.malformed";
pub const ROOM_CREATED: &str = "room.created";
pub const ROOM_JOINED: &str = "room.joined";
pub const ROOM_DELETED: &str = "room.deleted";
pub const ROOM_ACTIVE: &str = "room.active";
pub const GAME_STARTED: &str = "game.started";
pub const RELAY_DROPPED: &str = "relay.dropped";
