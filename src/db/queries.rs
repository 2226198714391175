use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::{NewPost, Post};

// ========== Posts ==========

/// Insert a new post, returning its ID.
pub async fn insert_post(pool: &SqlitePool, post: &NewPost) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO posts (body, author_id, author_name, channel_id)
        VALUES (?, ?, ?, ?)
        ",
    )
    .bind(&post.body)
    .bind(&post.author_id)
    .bind(&post.author_name)
    .bind(&post.channel_id)
    .execute(pool)
    .await
    .context("Failed to insert post")?;

    Ok(result.last_insert_rowid())
}

/// Get a post by its ID.
pub async fn get_post(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    sqlx::query_as("SELECT * FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post")
}

/// Reverse lookup: find the post announced by a Discord message.
pub async fn get_post_by_message_id(pool: &SqlitePool, message_id: &str) -> Result<Option<Post>> {
    sqlx::query_as("SELECT * FROM posts WHERE message_id = ?")
        .bind(message_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post by message id")
}

/// Attach the announcement message id to a post.
///
/// The id is a single assignment: re-attaching the same value is a no-op,
/// attaching a different value (or attaching to an unknown post) is an error.
pub async fn attach_message_id(pool: &SqlitePool, post_id: i64, message_id: &str) -> Result<()> {
    let result = sqlx::query(
        r"
        UPDATE posts
        SET message_id = ?1
        WHERE id = ?2 AND (message_id IS NULL OR message_id = ?1)
        ",
    )
    .bind(message_id)
    .bind(post_id)
    .execute(pool)
    .await
    .context("Failed to attach message id")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("post {post_id} not found or already announced under a different message");
    }

    Ok(())
}

/// Atomically claim the cross-post for a post.
///
/// This is the conditional update that closes the check-then-act race between
/// concurrent reaction handlers: only the caller that flips the flag here may
/// call the external post capability. Returns whether this caller won.
pub async fn try_claim_cross_post(pool: &SqlitePool, post_id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE posts SET cross_posted = 1 WHERE id = ? AND cross_posted = 0")
        .bind(post_id)
        .execute(pool)
        .await
        .context("Failed to claim cross-post")?;

    Ok(result.rows_affected() == 1)
}

/// Release a cross-post claim after a failed publish attempt, so a later
/// reaction event can retry.
pub async fn release_cross_post_claim(pool: &SqlitePool, post_id: i64) -> Result<()> {
    sqlx::query("UPDATE posts SET cross_posted = 0 WHERE id = ?")
        .bind(post_id)
        .execute(pool)
        .await
        .context("Failed to release cross-post claim")?;

    Ok(())
}

/// Snapshot for the cross-post decision: `(already_cross_posted, body)`.
pub async fn get_crosspost_state(pool: &SqlitePool, post_id: i64) -> Result<Option<(bool, String)>> {
    sqlx::query_as("SELECT cross_posted, body FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch cross-post state")
}

/// Most recently submitted posts, newest first.
pub async fn recent_posts(pool: &SqlitePool, limit: i64) -> Result<Vec<Post>> {
    sqlx::query_as("SELECT * FROM posts ORDER BY id DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to fetch recent posts")
}

/// Count all posts.
pub async fn count_posts(pool: &SqlitePool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;

    Ok(row.0)
}

// ========== Reactions ==========

/// Record a reaction, ignoring duplicates of the `(post, user, emoji)` triple.
///
/// Returns whether a new row was inserted.
pub async fn add_reaction(
    pool: &SqlitePool,
    post_id: i64,
    user_id: &str,
    emoji: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r"
        INSERT OR IGNORE INTO reactions (post_id, user_id, emoji)
        VALUES (?, ?, ?)
        ",
    )
    .bind(post_id)
    .bind(user_id)
    .bind(emoji)
    .execute(pool)
    .await
    .context("Failed to insert reaction")?;

    Ok(result.rows_affected() == 1)
}

/// Remove a reaction if present. Removing an unknown triple is a no-op.
///
/// Returns whether a row was deleted.
pub async fn remove_reaction(
    pool: &SqlitePool,
    post_id: i64,
    user_id: &str,
    emoji: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r"
        DELETE FROM reactions
        WHERE post_id = ? AND user_id = ? AND emoji = ?
        ",
    )
    .bind(post_id)
    .bind(user_id)
    .bind(emoji)
    .execute(pool)
    .await
    .context("Failed to delete reaction")?;

    Ok(result.rows_affected() == 1)
}

/// Count distinct users who reacted with `emoji` on a post, optionally
/// excluding one identity (the bot's own seed reaction).
pub async fn count_distinct_reactors(
    pool: &SqlitePool,
    post_id: i64,
    emoji: &str,
    excluding_user_id: Option<&str>,
) -> Result<i64> {
    let row: (i64,) = match excluding_user_id {
        Some(excluded) => {
            sqlx::query_as(
                r"
                SELECT COUNT(DISTINCT user_id) FROM reactions
                WHERE post_id = ? AND emoji = ? AND user_id != ?
                ",
            )
            .bind(post_id)
            .bind(emoji)
            .bind(excluded)
            .fetch_one(pool)
            .await
        }
        None => {
            sqlx::query_as(
                r"
                SELECT COUNT(DISTINCT user_id) FROM reactions
                WHERE post_id = ? AND emoji = ?
                ",
            )
            .bind(post_id)
            .bind(emoji)
            .fetch_one(pool)
            .await
        }
    }
    .context("Failed to count distinct reactors")?;

    Ok(row.0)
}
