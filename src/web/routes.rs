use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, warn};

use super::templates;
use super::WebState;
use crate::constants::MOTD_COMMAND;
use crate::db;
use crate::discord::types::{
    Interaction, InteractionResponse, INTERACTION_TYPE_COMMAND, INTERACTION_TYPE_PING,
};
use crate::discord::verify;
use crate::events::{self, ChatEvent};

/// Create the router with all routes.
pub fn router() -> Router<WebState> {
    Router::new()
        .route("/", get(home))
        .route("/last-updated", get(last_updated))
        .route("/healthz", get(health))
        .route("/discord-webhook", post(discord_webhook))
        .route("/events", post(ingest_event))
}

// ========== HTML Routes ==========

async fn home(State(state): State<WebState>) -> Response {
    let (message, last_updated) = state.ctx.motd.get().await;

    let recent = match db::recent_posts(state.ctx.db.pool(), 10).await {
        Ok(posts) => posts,
        Err(e) => {
            error!("Failed to fetch recent posts: {e:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    templates::render_home(&message, last_updated, &recent).into_response()
}

// ========== Plain Endpoints ==========

async fn last_updated(State(state): State<WebState>) -> String {
    let (_, last_updated) = state.ctx.motd.get().await;
    last_updated.to_string()
}

async fn health() -> &'static str {
    "ok"
}

// ========== Discord Webhook ==========

/// Interaction webhook: verifies the request signature, answers the PING
/// handshake, and maps the MOTD slash command to a submission event.
async fn discord_webhook(
    State(state): State<WebState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let (Some(signature), Some(timestamp)) = (
        header_str(&headers, "x-signature-ed25519"),
        header_str(&headers, "x-signature-timestamp"),
    ) else {
        return (StatusCode::UNAUTHORIZED, "Missing signature headers").into_response();
    };

    if let Err(e) = verify::verify_signature(&state.webhook_key, signature, timestamp, &body) {
        warn!("Rejected webhook request: {e:#}");
        return (StatusCode::UNAUTHORIZED, "Invalid signature").into_response();
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            warn!("Invalid interaction payload: {e}");
            return (StatusCode::BAD_REQUEST, "Invalid payload").into_response();
        }
    };

    if interaction.kind == INTERACTION_TYPE_PING {
        return Json(InteractionResponse::pong()).into_response();
    }

    // Single authorized guild.
    if interaction.guild_id.as_deref() != Some(state.ctx.config.discord_guild_id.as_str()) {
        warn!(guild_id = ?interaction.guild_id, "Interaction from unauthorized guild");
        return (StatusCode::UNAUTHORIZED, "Unauthorized guild").into_response();
    }

    if interaction.kind == INTERACTION_TYPE_COMMAND {
        return handle_command(&state, interaction).await;
    }

    (StatusCode::BAD_REQUEST, "Unknown interaction").into_response()
}

async fn handle_command(state: &WebState, interaction: Interaction) -> Response {
    let Some(data) = interaction.data else {
        return (StatusCode::BAD_REQUEST, "Missing command data").into_response();
    };

    if data.name != MOTD_COMMAND {
        return (StatusCode::BAD_REQUEST, "Unknown command").into_response();
    }

    let Some(message) = data
        .options
        .iter()
        .find(|option| option.name == "message")
        .map(|option| option.value.clone())
    else {
        return (StatusCode::BAD_REQUEST, "Missing message option").into_response();
    };

    let (author_id, author_name) = interaction
        .member
        .and_then(|member| member.user)
        .map_or((None, None), |user| {
            (Some(user.id), Some(user.username))
        });

    let event = ChatEvent::SubmitMessage {
        body: message.clone(),
        author_id,
        author_name,
        channel_id: interaction.channel_id,
    };

    if let Err(e) = events::handle_event(&state.ctx, event).await {
        error!("Failed to handle MOTD submission: {e:#}");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response();
    }

    Json(InteractionResponse::message(format!(
        "Updated the message of the day to: {message}"
    )))
    .into_response()
}

// ========== Event Ingest ==========

/// Authenticated ingest for the gateway collaborator's events.
async fn ingest_event(
    State(state): State<WebState>,
    headers: HeaderMap,
    Json(event): Json<ChatEvent>,
) -> Response {
    let Some(expected) = state.ctx.config.event_token.as_deref() else {
        return (StatusCode::NOT_FOUND, "Event ingest disabled").into_response();
    };

    if header_str(&headers, "x-relay-token") != Some(expected) {
        return (StatusCode::UNAUTHORIZED, "Invalid event token").into_response();
    }

    match events::handle_event(&state.ctx, event).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Failed to handle ingested event: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Event handling failed").into_response()
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
