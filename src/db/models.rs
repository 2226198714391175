use serde::{Deserialize, Serialize};

/// A submitted MOTD update, tracked through its announcement and possible
/// cross-posting.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub body: String,
    pub author_id: Option<String>,
    pub author_name: Option<String>,
    pub channel_id: Option<String>,
    pub message_id: Option<String>,
    pub cross_posted: bool,
    pub created_at: String,
}

/// One user's emoji reaction on a post's announcement message.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reaction {
    pub id: i64,
    pub post_id: i64,
    pub user_id: String,
    pub emoji: String,
    pub created_at: String,
}

/// Data for inserting a new post.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub body: String,
    pub author_id: Option<String>,
    pub author_name: Option<String>,
    pub channel_id: Option<String>,
}
