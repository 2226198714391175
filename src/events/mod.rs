//! Inbound chat-platform events and their handlers.
//!
//! The gateway connection itself lives outside this service. Whatever is
//! consuming the chat platform delivers events here, either directly (the
//! interactions webhook maps slash commands to [`ChatEvent::SubmitMessage`])
//! or through the authenticated `/events` endpoint. Handlers contain their
//! failures per event: a bad event never corrupts another post's state.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::crosspost;
use crate::db::{self, Database, NewPost};
use crate::discord::ChatApi;
use crate::motd::MotdStore;
use crate::social::SocialPoster;

/// Shared handles every event handler needs.
#[derive(Clone)]
pub struct AppContext {
    pub db: Database,
    pub motd: Arc<MotdStore>,
    pub chat: Arc<dyn ChatApi>,
    pub social: Arc<dyn SocialPoster>,
    pub config: Arc<Config>,
}

/// Inbound event shapes, independent of the wire format they arrived in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A user submitted a new MOTD.
    SubmitMessage {
        body: String,
        author_id: Option<String>,
        author_name: Option<String>,
        channel_id: Option<String>,
    },
    /// A collaborator published the announcement message for a post.
    AnnouncementPublished { post_id: i64, message_id: String },
    /// A user reacted on a message.
    ReactionAdded {
        message_id: String,
        user_id: String,
        emoji: String,
    },
    /// A user removed a reaction from a message.
    ReactionRemoved {
        message_id: String,
        user_id: String,
        emoji: String,
    },
}

/// Route one inbound event to its handler.
pub async fn handle_event(ctx: &AppContext, event: ChatEvent) -> Result<()> {
    match event {
        ChatEvent::SubmitMessage {
            body,
            author_id,
            author_name,
            channel_id,
        } => handle_submit(ctx, body, author_id, author_name, channel_id)
            .await
            .map(|_| ()),
        ChatEvent::AnnouncementPublished {
            post_id,
            message_id,
        } => handle_announcement(ctx, post_id, &message_id).await,
        ChatEvent::ReactionAdded {
            message_id,
            user_id,
            emoji,
        } => handle_reaction_added(ctx, &message_id, &user_id, &emoji).await,
        ChatEvent::ReactionRemoved {
            message_id,
            user_id,
            emoji,
        } => handle_reaction_removed(ctx, &message_id, &user_id, &emoji).await,
    }
}

/// Record a new MOTD submission, update the display message, and announce
/// the post so the community can react to it.
///
/// Returns the new post's ledger id.
pub async fn handle_submit(
    ctx: &AppContext,
    body: String,
    author_id: Option<String>,
    author_name: Option<String>,
    channel_id: Option<String>,
) -> Result<i64> {
    let channel_id = channel_id.unwrap_or_else(|| ctx.config.announce_channel_id.clone());

    let post_id = db::insert_post(
        ctx.db.pool(),
        &NewPost {
            body: body.clone(),
            author_id,
            author_name,
            channel_id: Some(channel_id.clone()),
        },
    )
    .await
    .context("Failed to record submission")?;

    ctx.motd
        .set(&body)
        .await
        .context("Failed to persist new MOTD")?;

    info!(post_id, "MOTD updated");

    // Announcement is best-effort: an unannounced post stays in the ledger
    // and can be announced later via AnnouncementPublished.
    let announcement = format!(
        "New message of the day: {body}\nReact with {} to cross-post it.",
        ctx.config.reaction_emoji
    );
    match ctx.chat.send_message(&channel_id, &announcement).await {
        Ok(message_id) => {
            db::attach_message_id(ctx.db.pool(), post_id, &message_id)
                .await
                .context("Failed to attach announcement message")?;
            seed_reaction(ctx, &channel_id, &message_id).await;
        }
        Err(e) => {
            warn!(post_id, "Failed to announce post: {e:#}");
        }
    }

    Ok(post_id)
}

/// Attach an externally published announcement message to its post.
async fn handle_announcement(ctx: &AppContext, post_id: i64, message_id: &str) -> Result<()> {
    db::attach_message_id(ctx.db.pool(), post_id, message_id).await?;

    debug!(post_id, message_id, "Announcement attached");

    if let Ok(Some(post)) = db::get_post(ctx.db.pool(), post_id).await {
        if let Some(channel_id) = post.channel_id.as_deref() {
            seed_reaction(ctx, channel_id, message_id).await;
        }
    }

    Ok(())
}

/// Record a reaction and dispatch the cross-post if the threshold is met.
async fn handle_reaction_added(
    ctx: &AppContext,
    message_id: &str,
    user_id: &str,
    emoji: &str,
) -> Result<()> {
    let pool = ctx.db.pool();

    // Reactions on messages we never announced are expected noise.
    let Some(post) = db::get_post_by_message_id(pool, message_id).await? else {
        debug!(message_id, "Reaction for unknown message, ignoring");
        return Ok(());
    };

    let inserted = db::add_reaction(pool, post.id, user_id, emoji).await?;
    if !inserted {
        debug!(post_id = post.id, user_id, "Duplicate reaction absorbed");
    }

    if emoji != ctx.config.reaction_emoji {
        return Ok(());
    }

    // Even a duplicate add re-evaluates: this is the opportunistic retry
    // path for posts whose earlier publish attempt failed.
    let should = crosspost::should_cross_post(
        pool,
        post.id,
        &ctx.config.reaction_emoji,
        ctx.config.reaction_threshold,
        &ctx.config.self_user_id,
    )
    .await?;

    if should {
        crosspost::dispatch(ctx, post.id).await?;
    }

    Ok(())
}

/// Remove a reaction. Unknown messages and never-inserted triples are no-ops.
async fn handle_reaction_removed(
    ctx: &AppContext,
    message_id: &str,
    user_id: &str,
    emoji: &str,
) -> Result<()> {
    let pool = ctx.db.pool();

    let Some(post) = db::get_post_by_message_id(pool, message_id).await? else {
        debug!(message_id, "Reaction removal for unknown message, ignoring");
        return Ok(());
    };

    let removed = db::remove_reaction(pool, post.id, user_id, emoji).await?;
    if removed {
        debug!(post_id = post.id, user_id, "Reaction removed");
    }

    Ok(())
}

/// Best-effort seed reaction so the announcement shows the voting emoji.
async fn seed_reaction(ctx: &AppContext, channel_id: &str, message_id: &str) {
    if let Err(e) = ctx
        .chat
        .add_reaction(channel_id, message_id, &ctx.config.reaction_emoji)
        .await
    {
        warn!(message_id, "Failed to seed reaction: {e:#}");
    }
}
