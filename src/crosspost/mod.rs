//! Threshold evaluation and the at-most-once cross-post dispatch.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::constants::ACK_EMOJI;
use crate::db;
use crate::events::AppContext;

/// Decide whether a post should be cross-posted right now.
///
/// Counts distinct reactors for the target emoji, excluding the bot's own
/// seed identity, and checks the post has not already been cross-posted.
/// Mutates nothing; the authoritative re-check happens in [`dispatch`].
pub async fn should_cross_post(
    pool: &SqlitePool,
    post_id: i64,
    emoji: &str,
    threshold: i64,
    self_user_id: &str,
) -> Result<bool> {
    let Some((already_cross_posted, _)) = db::get_crosspost_state(pool, post_id).await? else {
        return Ok(false);
    };
    if already_cross_posted {
        return Ok(false);
    }

    let count = db::count_distinct_reactors(pool, post_id, emoji, Some(self_user_id)).await?;
    debug!(post_id, count, threshold, "Evaluated cross-post threshold");

    Ok(count >= threshold)
}

/// Cross-post a post at most once.
///
/// The winner is decided by an atomic conditional update on the ledger, not
/// an in-process lock, so concurrent evaluations for the same post cannot
/// both publish even across independent event dispatches. A failed publish
/// releases the claim, leaving the post eligible for a retry on the next
/// qualifying reaction event.
pub async fn dispatch(ctx: &AppContext, post_id: i64) -> Result<()> {
    let pool = ctx.db.pool();

    let Some((_, body)) = db::get_crosspost_state(pool, post_id).await? else {
        anyhow::bail!("post {post_id} vanished before dispatch");
    };

    if !db::try_claim_cross_post(pool, post_id).await? {
        debug!(post_id, "Cross-post already claimed, skipping");
        return Ok(());
    }

    let external_id = match ctx.social.publish(&body).await {
        Ok(id) => id,
        Err(e) => {
            warn!(post_id, "Publish failed, releasing claim: {e:#}");
            db::release_cross_post_claim(pool, post_id).await?;
            return Ok(());
        }
    };

    info!(post_id, external_id = %external_id, "Post cross-posted");

    // The cross-post is committed at this point; acknowledgment failures
    // never roll it back.
    acknowledge(ctx, post_id, &external_id).await;

    Ok(())
}

/// Best-effort acknowledgment in the originating channel.
async fn acknowledge(ctx: &AppContext, post_id: i64, external_id: &str) {
    let post = match db::get_post(ctx.db.pool(), post_id).await {
        Ok(Some(post)) => post,
        Ok(None) => return,
        Err(e) => {
            warn!(post_id, "Failed to load post for acknowledgment: {e:#}");
            return;
        }
    };

    let (Some(channel_id), Some(message_id)) =
        (post.channel_id.as_deref(), post.message_id.as_deref())
    else {
        return;
    };

    if let Err(e) = ctx.chat.add_reaction(channel_id, message_id, ACK_EMOJI).await {
        warn!(post_id, "Failed to add acknowledgment reaction: {e:#}");
    }

    let notice = format!("Cross-posted! ({external_id})");
    if let Err(e) = ctx.chat.send_message(channel_id, &notice).await {
        warn!(post_id, "Failed to send acknowledgment message: {e:#}");
    }
}
