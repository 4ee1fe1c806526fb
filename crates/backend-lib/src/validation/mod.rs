// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Message validation module.
//!
//! Serde already enforces the shape of every frame; this pass enforces field
//! rules and normalises room codes and names before the room store is touched.
//! Room codes are never rejected for their shape: an unknown code is the room
//! store's `RoomNotFound`. Relay payloads (`state`, `time`, `score`, chat text)
//! pass through unchanged.

use regex::Regex;
use sledrun_common::{ClientMessage, CosmeticsPatch, RoomCode};
use std::sync::LazyLock;
use thiserror::Error;

const MAX_PLAYER_NAME_CHARS: usize = 24;
const MAX_CHAT_MESSAGE_CHARS: usize = 200;
const MAX_COSMETIC_ID_CHARS: usize = 16;

static NAME_FORBIDDEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Cc}\p{Cf}]").expect("name regex"));

/// Possible validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid player name: {0}")]
    InvalidPlayerName(String),

    #[error("Invalid cosmetics: {0}")]
    InvalidCosmetics(String),

    #[error("Invalid chat message: {0}")]
    InvalidChatMessage(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trim and upper-case a room code the way clients type it
pub fn normalize_room_code(code: &str) -> RoomCode {
    code.trim().to_uppercase()
}

/// Trim a display name; blank names become `None` so the store picks a default
pub fn validate_player_name(name: Option<String>) -> ValidationResult<Option<String>> {
    let Some(name) = name else {
        return Ok(None);
    };
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }
    if name.chars().count() > MAX_PLAYER_NAME_CHARS {
        return Err(ValidationError::InvalidPlayerName(format!(
            "Name cannot exceed {MAX_PLAYER_NAME_CHARS} characters"
        )));
    }
    if NAME_FORBIDDEN_REGEX.is_match(name) {
        return Err(ValidationError::InvalidPlayerName(
            "Name contains control characters".to_string(),
        ));
    }
    Ok(Some(name.to_string()))
}

/// Cosmetic ids are not checked against the catalog, only bounded
pub fn validate_cosmetics_patch(patch: &CosmeticsPatch) -> ValidationResult<()> {
    if patch.is_empty() {
        return Err(ValidationError::InvalidCosmetics(
            "At least one of character, sled or hat is required".to_string(),
        ));
    }
    for id in [&patch.character, &patch.sled, &patch.hat]
        .into_iter()
        .flatten()
    {
        if id.is_empty() || id.chars().count() > MAX_COSMETIC_ID_CHARS {
            return Err(ValidationError::InvalidCosmetics(format!(
                "Cosmetic ids must be 1 to {MAX_COSMETIC_ID_CHARS} characters"
            )));
        }
    }
    Ok(())
}

/// Bound a chat line's length; the text itself is relayed as sent
pub fn validate_chat_message(message: &str) -> ValidationResult<()> {
    if message.chars().count() > MAX_CHAT_MESSAGE_CHARS {
        return Err(ValidationError::InvalidChatMessage(format!(
            "Message cannot exceed {MAX_CHAT_MESSAGE_CHARS} characters"
        )));
    }
    Ok(())
}

/// Validate a client message, returning it with codes and text normalised
pub fn validate_client_message(msg: ClientMessage) -> ValidationResult<ClientMessage> {
    let msg = match msg {
        ClientMessage::CreateRoom {
            mode,
            name,
            is_solo,
        } => ClientMessage::CreateRoom {
            mode,
            name: validate_player_name(name)?,
            is_solo,
        },
        ClientMessage::JoinRoom { code, name } => ClientMessage::JoinRoom {
            code: normalize_room_code(&code),
            name: validate_player_name(name)?,
        },
        ClientMessage::UpdateCosmetics { code, cosmetics } => {
            validate_cosmetics_patch(&cosmetics)?;
            ClientMessage::UpdateCosmetics {
                code: normalize_room_code(&code),
                cosmetics,
            }
        },
        ClientMessage::StartGame { code } => ClientMessage::StartGame {
            code: normalize_room_code(&code),
        },
        ClientMessage::PlayerState { code, state } => ClientMessage::PlayerState {
            code: normalize_room_code(&code),
            state,
        },
        ClientMessage::PlayerFinished { code, time, score } => ClientMessage::PlayerFinished {
            code: normalize_room_code(&code),
            time,
            score,
        },
        ClientMessage::ChatMessage { code, message } => {
            validate_chat_message(&message)?;
            ClientMessage::ChatMessage {
                code: normalize_room_code(&code),
                message,
            }
        },
        ClientMessage::LeaveRoom { code } => ClientMessage::LeaveRoom {
            code: normalize_room_code(&code),
        },
    };
    Ok(msg)
}
