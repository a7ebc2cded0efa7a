//! Plain HTTP calls to the Telegram Bot API.
//!
//! Used by the raw webhook mode, which handles updates without the bot
//! framework and answers with a direct `sendMessage` call.

use futures::future::{BoxFuture, FutureExt};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{Result, TelegramError};

/// Something that can deliver a reply to a chat.
pub trait ReplySender: Send + Sync {
    /// Send `text` to `chat_id`.
    fn send<'a>(&'a self, chat_id: i64, text: &'a str) -> BoxFuture<'a, Result<()>>;
}

/// Bot API client over `reqwest`.
#[derive(Clone)]
pub struct BotApiSender {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl BotApiSender {
    /// Create a sender for the given API base URL and bot token.
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    async fn call(&self, method: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let json: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() || json["ok"].as_bool() != Some(true) {
            let description = json["description"]
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("{} returned {}", method, status));
            return Err(TelegramError::Api(description));
        }

        Ok(json["result"].clone())
    }

    /// Send a text message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await?;
        debug!(chat_id = %chat_id, "Message sent via Bot API");
        Ok(())
    }

    /// Register `url` as the bot's webhook.
    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<()> {
        let mut body = json!({ "url": url, "allowed_updates": ["message", "edited_message"] });
        if let Some(secret) = secret {
            body["secret_token"] = json!(secret);
        }

        self.call("setWebhook", body)
            .await
            .map_err(|e| TelegramError::WebhookFailed(e.to_string()))?;
        info!(url = %url, "Webhook registered");
        Ok(())
    }
}

impl ReplySender for BotApiSender {
    fn send<'a>(&'a self, chat_id: i64, text: &'a str) -> BoxFuture<'a, Result<()>> {
        self.send_message(chat_id, text).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_send_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::Json(json!({"chat_id": 42, "text": "hello"})))
            .with_status(200)
            .with_body(r#"{"ok": true, "result": {"message_id": 1}}"#)
            .create_async()
            .await;

        let sender = BotApiSender::new(server.url(), "123:abc");
        sender.send_message(42, "hello").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_description() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/bot123:abc/sendMessage")
            .with_status(400)
            .with_body(r#"{"ok": false, "description": "Bad Request: chat not found"}"#)
            .create_async()
            .await;

        let sender = BotApiSender::new(server.url(), "123:abc");
        let err = sender.send(7, "hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Telegram API error: Bad Request: chat not found");
    }

    #[tokio::test]
    async fn test_set_webhook_with_secret() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/setWebhook")
            .match_body(Matcher::PartialJson(json!({
                "url": "https://bot.example.com/",
                "secret_token": "s3cret"
            })))
            .with_status(200)
            .with_body(r#"{"ok": true, "result": true}"#)
            .create_async()
            .await;

        let sender = BotApiSender::new(format!("{}/", server.url()), "123:abc");
        sender
            .set_webhook("https://bot.example.com/", Some("s3cret"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_webhook_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/bot123:abc/setWebhook")
            .with_status(401)
            .with_body(r#"{"ok": false, "description": "Unauthorized"}"#)
            .create_async()
            .await;

        let sender = BotApiSender::new(server.url(), "123:abc");
        let err = sender.set_webhook("https://x", None).await.unwrap_err();
        assert!(matches!(err, TelegramError::WebhookFailed(_)));
    }
}
