//! Error types for the Telegram front end.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relaybot_core::{ConfigError, InferenceError};
use serde_json::json;
use thiserror::Error;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The inference client could not be built.
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// Webhook registration or listener setup failed.
    #[error("Failed to register webhook: {0}")]
    WebhookFailed(String),

    /// Webhook mode was requested without a public URL.
    #[error("Webhook URL not set. Set WEBHOOK_URL (or RENDER_EXTERNAL_URL).")]
    NoWebhookUrl,

    /// A URL or socket address could not be parsed.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The Bot API answered `"ok": false`.
    #[error("Telegram API error: {0}")]
    Api(String),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        // Bot API URLs embed the token.
        TelegramError::HttpError(e.without_url().to_string())
    }
}

impl From<url::ParseError> for TelegramError {
    fn from(e: url::ParseError) -> Self {
        TelegramError::InvalidAddress(e.to_string())
    }
}

impl From<std::net::AddrParseError> for TelegramError {
    fn from(e: std::net::AddrParseError) -> Self {
        TelegramError::InvalidAddress(e.to_string())
    }
}

/// Errors returned to the webhook caller.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The secret token header is missing or wrong.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl WebhookError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string()
        }));
        (status, body).into_response()
    }
}
