//! Raw HTTP webhook server.
//!
//! Telegram POSTs each update to `/`. The handler extracts the chat id and
//! text and acknowledges with `ok` straight away so Telegram does not
//! redeliver. The relay then produces the reply in the background and it is
//! sent through the Bot API.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use relaybot_core::Relay;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::error::WebhookError;
use crate::handlers::{classify, command_reply, TextKind};
use crate::sender::ReplySender;
use crate::update::IncomingUpdate;

/// Header Telegram uses to echo the webhook secret.
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Fixed acknowledgement body.
pub const ACK: &str = "ok";

/// Body served on `GET /`.
pub const INDEX_BODY: &str = "Bot running";

/// State shared across webhook handlers.
#[derive(Clone)]
pub struct WebhookState {
    /// Message-to-reply pipeline.
    pub relay: Arc<Relay>,
    /// Outbound reply channel.
    pub sender: Arc<dyn ReplySender>,
    /// Expected secret token, if any.
    pub secret: Option<String>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl WebhookState {
    /// Creates webhook state.
    pub fn new(relay: Arc<Relay>, sender: Arc<dyn ReplySender>, secret: Option<String>) -> Self {
        Self {
            relay,
            sender,
            secret,
            start_time: Instant::now(),
        }
    }

    /// Returns the uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    fn check_secret(&self, headers: &HeaderMap) -> Result<(), WebhookError> {
        let Some(expected) = self.secret.as_deref() else {
            return Ok(());
        };

        let given = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if given == Some(expected) {
            Ok(())
        } else {
            Err(WebhookError::Forbidden("invalid secret token".to_string()))
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok".
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since start.
    pub uptime_seconds: u64,
}

/// Creates the webhook router.
pub fn create_router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(index).post(receive_update))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the webhook server.
pub async fn serve(addr: &str, state: WebhookState) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Webhook server listening on {}", addr);
    axum::serve(listener, create_router(state)).await
}

/// GET / - liveness text.
async fn index() -> &'static str {
    INDEX_BODY
}

/// GET /health - Health check endpoint.
async fn health(State(state): State<WebhookState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// POST / - one Telegram update.
///
/// Acknowledges immediately; the reply is produced in a background task so a
/// slow or cold model never holds the request past Telegram's timeout.
async fn receive_update(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, WebhookError> {
    if let Err(e) = state.check_secret(&headers) {
        warn!("Rejected webhook call with invalid secret token");
        return Err(e);
    }

    let update = match IncomingUpdate::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed update");
            return Ok(ACK);
        }
    };

    let Some((chat_id, text)) = update.chat_text() else {
        debug!(update_id = ?update.update_id, "Ignoring update without text");
        return Ok(ACK);
    };

    if let TextKind::UnknownCommand(cmd) = classify(text) {
        debug!(chat_id = %chat_id, cmd = %cmd, "Ignoring unknown command");
        return Ok(ACK);
    }

    let text = text.to_string();
    tokio::spawn(async move {
        answer(&state, chat_id, &text).await;
    });

    Ok(ACK)
}

/// Produce and send the reply for one chat message.
async fn answer(state: &WebhookState, chat_id: i64, text: &str) {
    let reply = match classify(text) {
        TextKind::Chat(message) => {
            info!(chat_id = %chat_id, "Regular message received");
            state.relay.respond(chat_id, message).await
        }
        TextKind::Command(cmd) => command_reply(&cmd, &state.relay, chat_id).await,
        TextKind::UnknownCommand(_) => return,
    };

    if let Err(e) = state.sender.send(chat_id, &reply).await {
        error!(chat_id = %chat_id, error = %e, "Failed to send reply");
    }
}
