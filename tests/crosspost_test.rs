//! Integration tests for the reaction-threshold cross-posting workflow.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use motd_relay::config::Config;
use motd_relay::crosspost;
use motd_relay::db::{self, Database, NewPost};
use motd_relay::discord::ChatApi;
use motd_relay::events::{self, AppContext, ChatEvent};
use motd_relay::motd::MotdStore;
use motd_relay::social::SocialPoster;
use tempfile::TempDir;

const EMOJI: &str = "\u{1f4e3}";

/// Chat mock that records calls and hands out sequential message ids.
#[derive(Default)]
struct RecordingChat {
    messages: Mutex<Vec<(String, String)>>,
    reactions: Mutex<Vec<(String, String, String)>>,
    next_id: AtomicUsize,
}

#[async_trait]
impl ChatApi for RecordingChat {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.messages
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(format!("m{n}"))
    }

    async fn add_reaction(&self, channel_id: &str, message_id: &str, emoji: &str) -> Result<()> {
        self.reactions.lock().unwrap().push((
            channel_id.to_string(),
            message_id.to_string(),
            emoji.to_string(),
        ));
        Ok(())
    }
}

/// Social mock that counts attempts and can be switched into failure mode.
#[derive(Default)]
struct RecordingPoster {
    published: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    fail: AtomicBool,
}

#[async_trait]
impl SocialPoster for RecordingPoster {
    async fn publish(&self, text: &str) -> Result<String> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("social platform unavailable");
        }
        self.published.lock().unwrap().push(text.to_string());
        Ok(format!("ext-{n}"))
    }
}

async fn setup_ctx() -> (AppContext, Arc<RecordingChat>, Arc<RecordingPoster>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::new(&temp_dir.path().join("test.sqlite"))
        .await
        .expect("Failed to create database");
    let motd = MotdStore::load(temp_dir.path().join("motd.json"), "default").await;

    let chat = Arc::new(RecordingChat::default());
    let poster = Arc::new(RecordingPoster::default());

    let ctx = AppContext {
        db,
        motd: Arc::new(motd),
        chat: chat.clone(),
        social: poster.clone(),
        config: Arc::new(Config::for_testing()),
    };

    (ctx, chat, poster, temp_dir)
}

/// Insert a post announced under `message_id`, bypassing the chat mock.
async fn announced_post(ctx: &AppContext, body: &str, message_id: &str) -> i64 {
    let post_id = db::insert_post(
        ctx.db.pool(),
        &NewPost {
            body: body.to_string(),
            author_id: None,
            author_name: None,
            channel_id: Some("channel-1".to_string()),
        },
    )
    .await
    .unwrap();
    db::attach_message_id(ctx.db.pool(), post_id, message_id)
        .await
        .unwrap();
    post_id
}

async fn react(ctx: &AppContext, message_id: &str, user_id: &str) {
    events::handle_event(
        ctx,
        ChatEvent::ReactionAdded {
            message_id: message_id.to_string(),
            user_id: user_id.to_string(),
            emoji: EMOJI.to_string(),
        },
    )
    .await
    .expect("Reaction event should be handled");
}

#[tokio::test]
async fn test_threshold_boundary_excludes_seed_reaction() {
    let (ctx, _chat, poster, _temp_dir) = setup_ctx().await;
    let post_id = announced_post(&ctx, "approved?", "m1").await;

    // Seed reaction from the bot itself, then two external reactors.
    react(&ctx, "m1", "bot-1").await;
    react(&ctx, "m1", "u1").await;
    react(&ctx, "m1", "u2").await;

    assert!(!crosspost::should_cross_post(ctx.db.pool(), post_id, EMOJI, 3, "bot-1")
        .await
        .unwrap());
    assert_eq!(poster.attempts.load(Ordering::SeqCst), 0);

    // The third distinct external reactor crosses the threshold.
    react(&ctx, "m1", "u3").await;

    assert_eq!(poster.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(*poster.published.lock().unwrap(), ["approved?"]);

    let (cross_posted, _) = db::get_crosspost_state(ctx.db.pool(), post_id)
        .await
        .unwrap()
        .unwrap();
    assert!(cross_posted);
}

#[tokio::test]
async fn test_concurrent_dispatch_publishes_once() {
    let (ctx, _chat, poster, _temp_dir) = setup_ctx().await;
    let post_id = announced_post(&ctx, "race me", "m1").await;

    for user in ["u1", "u2", "u3"] {
        db::add_reaction(ctx.db.pool(), post_id, user, EMOJI)
            .await
            .unwrap();
    }

    // Fire concurrent threshold-crossing dispatches; the conditional update
    // in the ledger must let exactly one through.
    let mut handles = Vec::new();
    for _ in 0..8 {
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            crosspost::dispatch(&ctx, post_id).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("Dispatch should not error");
    }

    assert_eq!(poster.published.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_publish_leaves_post_retryable() {
    let (ctx, _chat, poster, _temp_dir) = setup_ctx().await;
    let post_id = announced_post(&ctx, "flaky", "m1").await;
    poster.fail.store(true, Ordering::SeqCst);

    react(&ctx, "m1", "u1").await;
    react(&ctx, "m1", "u2").await;
    react(&ctx, "m1", "u3").await;

    // The publish was attempted and failed; the flag must stay clear.
    assert_eq!(poster.attempts.load(Ordering::SeqCst), 1);
    let (cross_posted, _) = db::get_crosspost_state(ctx.db.pool(), post_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!cross_posted);

    // A later reaction event (here a duplicate add) retries and succeeds.
    poster.fail.store(false, Ordering::SeqCst);
    react(&ctx, "m1", "u1").await;

    assert_eq!(*poster.published.lock().unwrap(), ["flaky"]);
    let (cross_posted, _) = db::get_crosspost_state(ctx.db.pool(), post_id)
        .await
        .unwrap()
        .unwrap();
    assert!(cross_posted);
}

#[tokio::test]
async fn test_submit_to_crosspost_scenario() {
    let (ctx, chat, poster, _temp_dir) = setup_ctx().await;

    // Submit "foo"; the announcement message becomes "m1".
    events::handle_event(
        &ctx,
        ChatEvent::SubmitMessage {
            body: "foo".to_string(),
            author_id: Some("u0".to_string()),
            author_name: Some("alice".to_string()),
            channel_id: None,
        },
    )
    .await
    .unwrap();

    let (message, _) = ctx.motd.get().await;
    assert_eq!(message, "foo");

    let post = db::get_post_by_message_id(ctx.db.pool(), "m1")
        .await
        .unwrap()
        .expect("Submission should be announced as m1");
    assert_eq!(post.body, "foo");

    // The announcement went to the configured channel and quotes the body.
    {
        let messages = chat.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "channel-1");
        assert!(messages[0].1.contains("foo"));
    }

    // The bot seeded its own reaction on the announcement.
    assert_eq!(
        chat.reactions.lock().unwrap().first(),
        Some(&(
            "channel-1".to_string(),
            "m1".to_string(),
            EMOJI.to_string()
        ))
    );

    // Gateway echoes the seed reaction, then three distinct users react.
    react(&ctx, "m1", "bot-1").await;
    react(&ctx, "m1", "u1").await;
    react(&ctx, "m1", "u2").await;
    react(&ctx, "m1", "u3").await;

    assert_eq!(*poster.published.lock().unwrap(), ["foo"]);

    // A fourth reaction produces no second call.
    react(&ctx, "m1", "u4").await;
    assert_eq!(poster.published.lock().unwrap().len(), 1);
    assert_eq!(poster.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_reaction_for_unknown_message_is_ignored() {
    let (ctx, _chat, poster, _temp_dir) = setup_ctx().await;

    react(&ctx, "never-announced", "u1").await;

    assert_eq!(poster.attempts.load(Ordering::SeqCst), 0);
    assert_eq!(db::count_posts(ctx.db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_removed_reaction_no_longer_counts() {
    let (ctx, _chat, poster, _temp_dir) = setup_ctx().await;
    announced_post(&ctx, "undecided", "m1").await;

    react(&ctx, "m1", "u1").await;
    react(&ctx, "m1", "u2").await;

    events::handle_event(
        &ctx,
        ChatEvent::ReactionRemoved {
            message_id: "m1".to_string(),
            user_id: "u2".to_string(),
            emoji: EMOJI.to_string(),
        },
    )
    .await
    .unwrap();

    // u1 + u3 is still only two distinct reactors.
    react(&ctx, "m1", "u3").await;
    assert_eq!(poster.attempts.load(Ordering::SeqCst), 0);

    react(&ctx, "m1", "u4").await;
    assert_eq!(*poster.published.lock().unwrap(), ["undecided"]);
}

#[tokio::test]
async fn test_announcement_event_attaches_and_seeds() {
    let (ctx, chat, _poster, _temp_dir) = setup_ctx().await;

    let post_id = db::insert_post(
        ctx.db.pool(),
        &NewPost {
            body: "announced elsewhere".to_string(),
            author_id: None,
            author_name: None,
            channel_id: Some("channel-9".to_string()),
        },
    )
    .await
    .unwrap();

    events::handle_event(
        &ctx,
        ChatEvent::AnnouncementPublished {
            post_id,
            message_id: "m77".to_string(),
        },
    )
    .await
    .unwrap();

    let post = db::get_post(ctx.db.pool(), post_id).await.unwrap().unwrap();
    assert_eq!(post.message_id.as_deref(), Some("m77"));

    assert_eq!(
        *chat.reactions.lock().unwrap(),
        [(
            "channel-9".to_string(),
            "m77".to_string(),
            EMOJI.to_string()
        )]
    );
}
