// ============================
// sledrun-backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Sources, lowest to highest precedence: built-in defaults, a TOML file
//! (`sledrun.toml` unless another path is given), `SLEDRUN_`-prefixed
//! environment variables (nested keys split on `__`), and finally `PORT`.
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sledrun.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON log lines instead of the human format
    pub log_json: bool,
    /// Outbound queue length per connection; relays beyond it are dropped
    pub client_channel_capacity: usize,
    /// Room limits
    pub rooms: RoomSettings,
}

/// Room capacity limits
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RoomSettings {
    /// `maxPlayers` for rooms created through `createRoom`
    pub default_max_players: usize,
    /// `maxPlayers` of the social hub
    pub hub_max_players: usize,
    /// Upper bound for any non-hub room
    pub max_players_cap: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: "info".to_string(),
            log_json: false,
            client_channel_capacity: 64,
            rooms: RoomSettings::default(),
        }
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            default_max_players: 8,
            hub_max_players: 50,
            max_players_cap: 16,
        }
    }
}

impl Settings {
    /// Layered configuration sources, without the `PORT` override
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let file = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("SLEDRUN_").split("__"))
    }

    /// Load, apply `PORT` and validate
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::from_figment(&Self::figment(config_path))
    }

    /// Extract settings from an already-built figment
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let mut settings: Settings = figment.extract()?;
        if let Ok(port) = std::env::var("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid PORT {port:?}: {e}"))?;
            settings.bind_addr.set_port(port);
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            bail!("unknown log level {:?}", self.log_level);
        }
        if self.client_channel_capacity == 0 {
            bail!("client_channel_capacity must be at least 1");
        }
        let rooms = &self.rooms;
        if rooms.default_max_players == 0 || rooms.hub_max_players == 0 {
            bail!("room capacities must be at least 1");
        }
        if rooms.default_max_players > rooms.max_players_cap {
            bail!(
                "default_max_players ({}) exceeds max_players_cap ({})",
                rooms.default_max_players,
                rooms.max_players_cap
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr.port(), 3000);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation() {
        let mut invalid = Settings::default();
        invalid.log_level = "loud".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = Settings::default();
        invalid.client_channel_capacity = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = Settings::default();
        invalid.rooms.default_max_players = 20;
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_load_settings_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                bind_addr = "127.0.0.1:4000"
                log_level = "debug"

                [rooms]
                hub_max_players = 30
                "#,
            )?;
            jail.set_env("SLEDRUN_LOG_LEVEL", "warn");
            jail.set_env("SLEDRUN_ROOMS__DEFAULT_MAX_PLAYERS", "4");

            let settings = Settings::load(None).map_err(|e| e.to_string())?;
            assert_eq!(settings.bind_addr.to_string(), "127.0.0.1:4000");
            // Environment takes precedence over the file
            assert_eq!(settings.log_level, "warn");
            assert_eq!(settings.rooms.hub_max_players, 30);
            assert_eq!(settings.rooms.default_max_players, 4);
            assert_eq!(settings.rooms.max_players_cap, 16);
            Ok(())
        });
    }

    #[test]
    fn test_port_env_overrides_bind_port() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "8123");
            let settings = Settings::load(None).map_err(|e| e.to_string())?;
            assert_eq!(settings.bind_addr.port(), 8123);
            assert_eq!(settings.bind_addr.ip().to_string(), "0.0.0.0");
            Ok(())
        });
    }

    #[test]
    fn test_bad_port_env_is_an_error() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "not-a-port");
            assert!(Settings::load(None).is_err());
            Ok(())
        });
    }
}
