use std::path::PathBuf;

use thiserror::Error;

use crate::constants::{DEFAULT_MOTD, DEFAULT_REACTION_EMOJI, DEFAULT_REACTION_THRESHOLD};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_path: PathBuf,
    pub motd_path: PathBuf,
    pub default_motd: String,

    // Web Server
    pub web_host: String,
    pub web_port: u16,

    // Discord
    pub discord_api_base: String,
    pub discord_application_id: String,
    pub discord_guild_id: String,
    pub discord_bot_token: String,
    pub discord_public_key: String,
    pub announce_channel_id: String,
    pub self_user_id: String,

    // Cross-posting
    pub reaction_emoji: String,
    pub reaction_threshold: i64,
    pub social_api_url: String,
    pub social_api_token: String,

    // Event ingest (gateway collaborator), disabled when unset
    pub event_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Storage
            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/relay.sqlite")),
            motd_path: PathBuf::from(env_or_default("MOTD_PATH", "./data/motd.json")),
            default_motd: env_or_default("DEFAULT_MOTD", DEFAULT_MOTD),

            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8080)?,

            // Discord
            discord_api_base: env_or_default("DISCORD_API_BASE", "https://discord.com/api/v10"),
            discord_application_id: required_env("DISCORD_APPLICATION_ID")?,
            discord_guild_id: required_env("DISCORD_GUILD_ID")?,
            discord_bot_token: required_env("DISCORD_BOT_TOKEN")?,
            discord_public_key: required_env("DISCORD_PUBLIC_KEY")?,
            announce_channel_id: required_env("ANNOUNCE_CHANNEL_ID")?,
            self_user_id: required_env("SELF_USER_ID")?,

            // Cross-posting
            reaction_emoji: env_or_default("REACTION_EMOJI", DEFAULT_REACTION_EMOJI),
            reaction_threshold: parse_env_i64("REACTION_THRESHOLD", DEFAULT_REACTION_THRESHOLD)?,
            social_api_url: required_env("SOCIAL_API_URL")?,
            social_api_token: required_env("SOCIAL_API_TOKEN")?,

            // Event ingest
            event_token: optional_env("EVENT_TOKEN"),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reaction_threshold < 1 {
            return Err(ConfigError::InvalidValue {
                name: "REACTION_THRESHOLD".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.reaction_emoji.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "REACTION_EMOJI".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.social_api_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "SOCIAL_API_URL".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        let key = hex::decode(&self.discord_public_key).map_err(|_| ConfigError::InvalidValue {
            name: "DISCORD_PUBLIC_KEY".to_string(),
            message: "must be hex-encoded".to_string(),
        })?;
        if key.len() != 32 {
            return Err(ConfigError::InvalidValue {
                name: "DISCORD_PUBLIC_KEY".to_string(),
                message: "must decode to 32 bytes".to_string(),
            });
        }
        Ok(())
    }

    /// Configuration preset for integration tests.
    ///
    /// Required fields are filled with placeholder values; tests override the
    /// pieces they exercise with struct-update syntax.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            database_path: PathBuf::from("./data/test.sqlite"),
            motd_path: PathBuf::from("./data/test-motd.json"),
            default_motd: DEFAULT_MOTD.to_string(),
            web_host: "127.0.0.1".to_string(),
            web_port: 0,
            discord_api_base: "https://discord.invalid/api/v10".to_string(),
            discord_application_id: "app-1".to_string(),
            discord_guild_id: "guild-1".to_string(),
            discord_bot_token: "test-token".to_string(),
            discord_public_key: "0".repeat(64),
            announce_channel_id: "channel-1".to_string(),
            self_user_id: "bot-1".to_string(),
            reaction_emoji: DEFAULT_REACTION_EMOJI.to_string(),
            reaction_threshold: DEFAULT_REACTION_THRESHOLD,
            social_api_url: "https://social.invalid/api/posts".to_string(),
            social_api_token: "test-social-token".to_string(),
            event_token: None,
        }
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_i64(name: &str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
