//! Outbound client for the external social platform.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::constants::HTTP_USER_AGENT;

/// Capability to publish text to the external platform.
///
/// The relay makes a single attempt per dispatch; retry policy lives with the
/// caller (opportunistic, on later reaction events).
#[async_trait]
pub trait SocialPoster: Send + Sync {
    /// Publish `text`, returning the platform's id for the created post.
    async fn publish(&self, text: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    id: String,
}

/// HTTP implementation posting to a bearer-token JSON endpoint.
pub struct HttpPoster {
    client: Client,
    api_url: String,
    token: String,
}

impl HttpPoster {
    #[must_use]
    pub fn new(api_url: &str, token: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(HTTP_USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_url: api_url.to_string(),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl SocialPoster for HttpPoster {
    async fn publish(&self, text: &str) -> Result<String> {
        debug!("Publishing to social platform");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .context("Failed to send social post")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Social post rejected with status {status}");
        }

        let body: PublishResponse = response
            .json()
            .await
            .context("Failed to parse social post response")?;

        info!(id = %body.id, "Cross-post published");
        Ok(body.id)
    }
}
