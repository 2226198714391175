//! Discord interaction and command payload types.

use serde::{Deserialize, Serialize};

/// Interaction type: PING handshake.
pub const INTERACTION_TYPE_PING: u8 = 1;
/// Interaction type: application command invocation.
pub const INTERACTION_TYPE_COMMAND: u8 = 2;

/// Response type: PONG (answers a PING).
pub const RESPONSE_TYPE_PONG: u8 = 1;
/// Response type: channel message with source.
pub const RESPONSE_TYPE_MESSAGE: u8 = 4;

/// Command type: chat input (slash command).
pub const COMMAND_TYPE_CHAT_INPUT: u8 = 1;
/// Command option type: string.
pub const OPTION_TYPE_STRING: u8 = 3;

/// An inbound interaction delivered to the webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub data: Option<InteractionData>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub member: Option<GuildMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuildMember {
    #[serde(default)]
    pub user: Option<DiscordUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<InteractionOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionOption {
    pub name: String,
    pub value: String,
}

/// Synchronous response returned from the webhook.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionResponseData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponseData {
    pub content: String,
}

impl InteractionResponse {
    /// PONG response for the PING handshake.
    #[must_use]
    pub fn pong() -> Self {
        Self {
            kind: RESPONSE_TYPE_PONG,
            data: None,
        }
    }

    /// Plain message response shown in the invoking channel.
    #[must_use]
    pub fn message(content: impl Into<String>) -> Self {
        Self {
            kind: RESPONSE_TYPE_MESSAGE,
            data: Some(InteractionResponseData {
                content: content.into(),
            }),
        }
    }
}

/// Guild command registration payload.
#[derive(Debug, Clone, Serialize)]
pub struct Command {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub description: String,
    pub options: Vec<CommandOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub required: bool,
}
