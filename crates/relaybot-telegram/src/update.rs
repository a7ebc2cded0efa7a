//! Minimal view of a Telegram update as posted to the raw webhook.
//!
//! Only the fields the relay needs are modelled; everything else in the
//! payload is ignored so new Bot API fields never break parsing.

use serde::Deserialize;

/// An incoming update.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingUpdate {
    /// Update sequence number.
    #[serde(default)]
    pub update_id: Option<i64>,
    /// A new message.
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    /// An edited message.
    #[serde(default)]
    pub edited_message: Option<IncomingMessage>,
}

/// A message inside an update.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    /// The chat the message belongs to.
    pub chat: IncomingChat,
    /// Text, absent for stickers, photos and the like.
    #[serde(default)]
    pub text: Option<String>,
}

/// The chat a message was sent in.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingChat {
    /// Chat identifier.
    pub id: i64,
}

impl IncomingUpdate {
    /// Parse an update from a request body.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// The chat id and non-empty text of this update, if any.
    pub fn chat_text(&self) -> Option<(i64, &str)> {
        let message = self.message.as_ref().or(self.edited_message.as_ref())?;
        let text = message.text.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        Some((message.chat.id, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message() {
        let body = br#"{
            "update_id": 10,
            "message": {
                "message_id": 5,
                "date": 1700000000,
                "from": {"id": 99, "is_bot": false, "first_name": "Ann"},
                "chat": {"id": 99, "type": "private"},
                "text": "  hello bot  "
            }
        }"#;

        let update = IncomingUpdate::from_slice(body).unwrap();
        assert_eq!(update.update_id, Some(10));
        assert_eq!(update.chat_text(), Some((99, "hello bot")));
    }

    #[test]
    fn test_edited_message() {
        let body = br#"{"update_id": 11, "edited_message": {"chat": {"id": -100}, "text": "fixed"}}"#;
        let update = IncomingUpdate::from_slice(body).unwrap();
        assert_eq!(update.chat_text(), Some((-100, "fixed")));
    }

    #[test]
    fn test_non_text_updates() {
        let sticker = br#"{"update_id": 1, "message": {"chat": {"id": 1}, "sticker": {}}}"#;
        assert!(IncomingUpdate::from_slice(sticker).unwrap().chat_text().is_none());

        let blank = br#"{"update_id": 1, "message": {"chat": {"id": 1}, "text": "   "}}"#;
        assert!(IncomingUpdate::from_slice(blank).unwrap().chat_text().is_none());

        let callback = br#"{"update_id": 1, "callback_query": {"id": "x"}}"#;
        assert!(IncomingUpdate::from_slice(callback).unwrap().chat_text().is_none());
    }

    #[test]
    fn test_malformed_body() {
        assert!(IncomingUpdate::from_slice(b"not json").is_err());
        assert!(IncomingUpdate::from_slice(br#"{"message": {"text": "no chat"}}"#).is_err());
    }
}
