//! Shared constants used across the application.

/// Fallback MOTD used when no persisted snapshot exists yet.
pub const DEFAULT_MOTD: &str = "does citadel usually make money off these things?";

/// User agent string sent on outbound HTTP requests.
pub const HTTP_USER_AGENT: &str = concat!("motd-relay/", env!("CARGO_PKG_VERSION"));

/// Name of the guild slash command that updates the MOTD.
pub const MOTD_COMMAND: &str = "motd";

/// Default emoji whose reactions count toward the cross-post threshold.
pub const DEFAULT_REACTION_EMOJI: &str = "\u{1f4e3}";

/// Default number of distinct reactors required to cross-post.
pub const DEFAULT_REACTION_THRESHOLD: i64 = 3;

/// Emoji used to acknowledge a successful cross-post on the announcement.
pub const ACK_EMOJI: &str = "\u{2705}";
