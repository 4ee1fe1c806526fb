// ============================
// sledrun-backend-lib/src/room.rs
// ============================
//! In-memory room store.
//!
//! Every operation on a room runs while holding that room's `DashMap` shard
//! lock, so two operations on the same room never interleave. The invariant
//! maintained throughout: whenever `players` is non-empty, `host_id` is one
//! of its keys and that player is the only one with `is_host` set.
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use metrics::{counter, gauge};
use rand::Rng;
use serde_json::Value;
use sledrun_common::{
    ClientId, Cosmetics, CosmeticsPatch, GameMode, Player, PlayerMap, Room, RoomCode,
    RoomOptions, HUB_CODE,
};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::RoomSettings;
use crate::metrics as keys;

/// Seeds are drawn uniformly from `0..SEED_RANGE`
pub const SEED_RANGE: u32 = 1_000_000;

/// Random draws tried before `create_room` gives up on finding a free code
const MAX_CODE_ATTEMPTS: usize = 256;

/// Reasons a room operation can be refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Room full")]
    RoomFull,

    #[error("Only the host can start the game")]
    NotHost,

    #[error("No room codes available")]
    CodesExhausted,
}

/// What a leave did to the room
#[derive(Debug, Clone, PartialEq)]
pub enum Departure {
    /// Others remain; carries the room after the leave (host possibly promoted)
    Remaining(Room),
    /// The last player left and the room was deleted
    Closed,
}

/// Manager for all active rooms
pub struct RoomStore {
    rooms: DashMap<RoomCode, Room>,
    limits: RoomSettings,
}

impl RoomStore {
    /// Create an empty store
    pub fn new(limits: RoomSettings) -> Self {
        Self {
            rooms: DashMap::new(),
            limits,
        }
    }

    /// Capacity limits this store was built with
    pub fn limits(&self) -> RoomSettings {
        self.limits
    }

    /// Create a room. With a `reserved_code` that is already taken the
    /// existing room is returned unchanged. Non-hub rooms never exceed
    /// `max_players_cap`.
    ///
    /// # Errors
    /// `CodesExhausted` when no free generated code was found.
    pub fn create_room(
        &self,
        host_id: &str,
        mode: GameMode,
        mut options: RoomOptions,
        reserved_code: Option<&str>,
    ) -> Result<Room, RoomError> {
        if mode != GameMode::Hub && reserved_code != Some(HUB_CODE) {
            options.max_players = options.max_players.min(self.limits.max_players_cap);
        }

        if let Some(code) = reserved_code {
            return Ok(match self.rooms.entry(code.to_string()) {
                Entry::Occupied(existing) => {
                    debug!(code, "reserved room already exists, reusing it");
                    existing.get().clone()
                },
                Entry::Vacant(slot) => {
                    let room = new_room(code.to_string(), host_id, mode, options);
                    slot.insert(room.clone());
                    record_created(&room);
                    room
                },
            });
        }

        for _ in 0..MAX_CODE_ATTEMPTS {
            if let Entry::Vacant(slot) = self.rooms.entry(generate_room_code()) {
                let room = new_room(slot.key().clone(), host_id, mode, options);
                slot.insert(room.clone());
                record_created(&room);
                return Ok(room);
            }
        }
        error!(rooms = self.rooms.len(), "no free room code found");
        Err(RoomError::CodesExhausted)
    }

    /// Snapshot of one room
    pub fn get_room(&self, code: &str) -> Option<Room> {
        self.rooms.get(code).map(|room| room.value().clone())
    }

    /// Add a player to a room. Joining the hub creates it when absent.
    ///
    /// # Errors
    /// `RoomNotFound`, `GameAlreadyStarted` (never for the hub) or `RoomFull`.
    /// A refused join leaves membership untouched.
    pub fn join_room(
        &self,
        code: &str,
        player_id: &str,
        name: Option<&str>,
    ) -> Result<Room, RoomError> {
        let mut guard = match self.rooms.entry(code.to_string()) {
            Entry::Occupied(existing) => existing.into_ref(),
            Entry::Vacant(slot) if code == HUB_CODE => {
                let options = RoomOptions {
                    max_players: self.limits.hub_max_players,
                    is_solo: false,
                };
                let room = new_room(HUB_CODE.to_string(), player_id, GameMode::Hub, options);
                record_created(&room);
                slot.insert(room)
            },
            Entry::Vacant(_) => return Err(RoomError::RoomNotFound),
        };
        let room = guard.value_mut();

        if let Some(existing) = room.players.get_mut(player_id) {
            // Rejoin from the same connection: refresh the name, keep the slot
            if let Some(name) = name {
                existing.name = name.to_string();
            }
            return Ok(room.clone());
        }

        if room.started && !room.is_hub() {
            return Err(RoomError::GameAlreadyStarted);
        }
        if room.players.len() >= room.options.max_players {
            return Err(RoomError::RoomFull);
        }

        let name = name.map_or_else(
            || format!("Player {}", room.players.len() + 1),
            str::to_string,
        );
        let player = Player {
            id: player_id.to_string(),
            name,
            is_host: player_id == room.host_id,
            cosmetics: Cosmetics::default(),
            state: Value::Object(Default::default()),
        };
        room.players.insert(player_id.to_string(), player);

        // A hub created by someone who then left keeps its old host id until
        // the next member arrives.
        if !room.players.contains_key(&room.host_id) {
            promote_first(room);
        }

        counter!(keys::ROOM_JOINED).increment(1);
        Ok(room.clone())
    }

    /// Remove a player. Returns `None` when the room or player did not exist.
    pub fn leave_room(&self, code: &str, player_id: &str) -> Option<Departure> {
        {
            let mut guard = self.rooms.get_mut(code)?;
            let room = guard.value_mut();
            room.players.shift_remove(player_id)?;

            if !room.players.is_empty() {
                if room.host_id == player_id {
                    promote_first(room);
                    info!(code, new_host = %room.host_id, "host left, promoted next player");
                }
                return Some(Departure::Remaining(room.clone()));
            }
        }

        self.close_if_empty(code)
    }

    /// Delete a room that has no players left. Runs without the room's lock
    /// held, so someone may have joined in between; then the room survives.
    fn close_if_empty(&self, code: &str) -> Option<Departure> {
        if self
            .rooms
            .remove_if(code, |_, room| room.players.is_empty())
            .is_some()
        {
            counter!(keys::ROOM_DELETED).increment(1);
            gauge!(keys::ROOM_ACTIVE).decrement(1.0);
            info!(code, "room emptied and removed");
            return Some(Departure::Closed);
        }
        self.get_room(code).map(Departure::Remaining)
    }

    /// Shallow-merge cosmetics for one player
    pub fn update_player_cosmetics(
        &self,
        code: &str,
        player_id: &str,
        patch: &CosmeticsPatch,
    ) -> Option<Player> {
        let mut room = self.rooms.get_mut(code)?;
        let player = room.players.get_mut(player_id)?;
        player.cosmetics.apply(patch);
        Some(player.clone())
    }

    /// Mark the room started on behalf of `requester`
    ///
    /// # Errors
    /// `RoomNotFound` or `NotHost`.
    pub fn mark_started(&self, code: &str, requester: &str) -> Result<Room, RoomError> {
        let mut room = self.rooms.get_mut(code).ok_or(RoomError::RoomNotFound)?;
        if room.host_id != requester {
            return Err(RoomError::NotHost);
        }
        room.started = true;
        counter!(keys::GAME_STARTED).increment(1);
        Ok(room.clone())
    }

    /// Overwrite a member's last-known state. Returns false for non-members.
    pub fn record_player_state(&self, code: &str, player_id: &str, state: Value) -> bool {
        let Some(mut room) = self.rooms.get_mut(code) else {
            return false;
        };
        match room.players.get_mut(player_id) {
            Some(player) => {
                player.state = state;
                true
            },
            None => false,
        }
    }

    /// Whether `player_id` currently belongs to the room
    pub fn is_member(&self, code: &str, player_id: &str) -> bool {
        self.rooms
            .get(code)
            .is_some_and(|room| room.players.contains_key(player_id))
    }

    /// Connection ids of every member, in join order
    pub fn member_ids(&self, code: &str) -> Vec<ClientId> {
        self.rooms
            .get(code)
            .map(|room| room.players.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of active rooms
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Codes of all active rooms
    pub fn room_codes(&self) -> Vec<RoomCode> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }
}

/// Called with the room's shard lock held; must not touch the map
fn record_created(room: &Room) {
    counter!(keys::ROOM_CREATED).increment(1);
    gauge!(keys::ROOM_ACTIVE).increment(1.0);
    info!(code = %room.code, mode = ?room.mode, seed = room.seed, "room created");
}

fn new_room(code: RoomCode, host_id: &str, mode: GameMode, options: RoomOptions) -> Room {
    Room {
        code,
        mode,
        host_id: host_id.to_string(),
        started: false,
        seed: rand::rng().random_range(0..SEED_RANGE),
        players: PlayerMap::new(),
        options: RoomOptions {
            max_players: options.max_players.max(1),
            ..options
        },
        created_at: Utc::now(),
    }
}

/// Four uppercase hex characters from two random bytes
fn generate_room_code() -> RoomCode {
    format!("{:04X}", rand::rng().random::<u16>())
}

/// Hand the host role to the earliest-joined member
fn promote_first(room: &mut Room) {
    for player in room.players.values_mut() {
        player.is_host = false;
    }
    let next_host = room.players.get_index_mut(0).map(|(id, player)| {
        player.is_host = true;
        id.clone()
    });
    if let Some(id) = next_host {
        room.host_id = id;
    }
}
