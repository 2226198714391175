//! Discord REST client and interaction primitives.
//!
//! Gateway connection management lives outside this service; this module
//! covers the outbound REST capability and the webhook payload handling the
//! web layer builds on.

pub mod types;
pub mod verify;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::constants::{HTTP_USER_AGENT, MOTD_COMMAND};

/// Outbound chat-platform capability.
///
/// Call sites treat these as best-effort: failures are logged, never fatal.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Send `text` to a channel, returning the created message id.
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String>;

    /// Add an emoji reaction to a message as the bot user.
    async fn add_reaction(&self, channel_id: &str, message_id: &str, emoji: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    id: String,
}

/// Discord REST API client.
#[derive(Debug, Clone)]
pub struct DiscordClient {
    client: Client,
    api_base: String,
    bot_token: String,
    application_id: String,
    guild_id: String,
}

impl DiscordClient {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(HTTP_USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_base: config.discord_api_base.clone(),
            bot_token: config.discord_bot_token.clone(),
            application_id: config.discord_application_id.clone(),
            guild_id: config.discord_guild_id.clone(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.bot_token)
    }

    /// Register the guild slash command that updates the MOTD.
    ///
    /// Registration is idempotent on Discord's side: re-registering a command
    /// with the same name overwrites the previous definition.
    pub async fn register_commands(&self) -> Result<()> {
        let command = types::Command {
            name: MOTD_COMMAND.to_string(),
            kind: types::COMMAND_TYPE_CHAT_INPUT,
            description: "Update the message of the day".to_string(),
            options: vec![types::CommandOption {
                name: "message".to_string(),
                description: "The new message to display".to_string(),
                kind: types::OPTION_TYPE_STRING,
                required: true,
            }],
        };

        let url = format!(
            "{}/applications/{}/guilds/{}/commands",
            self.api_base, self.application_id, self.guild_id
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&command)
            .send()
            .await
            .context("Failed to send command registration")?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Command registration failed with status {status}: {body}");
        }

        info!(command = MOTD_COMMAND, "Registered guild slash command");
        Ok(())
    }
}

#[async_trait]
impl ChatApi for DiscordClient {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel_id);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "content": text }))
            .send()
            .await
            .context("Failed to send channel message")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Channel message rejected with status {status}");
        }

        let message: MessageResponse = response
            .json()
            .await
            .context("Failed to parse channel message response")?;

        debug!(channel_id, message_id = %message.id, "Sent channel message");
        Ok(message.id)
    }

    async fn add_reaction(&self, channel_id: &str, message_id: &str, emoji: &str) -> Result<()> {
        let url = format!(
            "{}/channels/{}/messages/{}/reactions/{}/@me",
            self.api_base,
            channel_id,
            message_id,
            urlencoding::encode(emoji)
        );

        let response = self
            .client
            .put(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .context("Failed to add reaction")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Reaction rejected with status {status}");
        }

        Ok(())
    }
}
