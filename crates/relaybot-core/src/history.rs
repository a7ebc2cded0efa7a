//! Short-term conversation memory.
//!
//! Each chat keeps its most recent turns in memory so follow-up messages
//! carry some context. There is no persistence and no idle eviction: a
//! chat's history lives until it is trimmed, cleared with `/reset`, or the
//! process exits.

use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;
use tracing::debug;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The Telegram user.
    User,
    /// The model.
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Author of the message.
    pub role: Role,
    /// Message text.
    pub text: String,
}

impl Turn {
    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Per-chat conversation history capped at a fixed number of turns.
pub struct ConversationStore {
    max_turns: usize,
    chats: RwLock<HashMap<i64, VecDeque<Turn>>>,
}

impl ConversationStore {
    /// Create a store keeping at most `max_turns` turns per chat.
    ///
    /// `max_turns == 0` disables memory entirely.
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns,
            chats: RwLock::new(HashMap::new()),
        }
    }

    /// Whether turns are being remembered at all.
    pub fn is_enabled(&self) -> bool {
        self.max_turns > 0
    }

    /// Maximum turns kept per chat.
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Record a completed exchange and trim the oldest turns.
    pub async fn record(&self, chat_id: i64, user_text: &str, reply: &str) {
        if !self.is_enabled() {
            return;
        }

        let mut chats = self.chats.write().await;
        let turns = chats.entry(chat_id).or_default();
        turns.push_back(Turn::user(user_text));
        turns.push_back(Turn::assistant(reply));

        while turns.len() > self.max_turns {
            turns.pop_front();
        }

        debug!(chat_id = %chat_id, turns = turns.len(), "Recorded conversation turn");
    }

    /// Snapshot of a chat's history, oldest first.
    pub async fn history(&self, chat_id: i64) -> Vec<Turn> {
        let chats = self.chats.read().await;
        chats
            .get(&chat_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Forget a chat. Returns whether anything was stored.
    pub async fn clear(&self, chat_id: i64) -> bool {
        let mut chats = self.chats.write().await;
        chats.remove(&chat_id).is_some()
    }

    /// Number of chats with stored history.
    pub async fn chat_count(&self) -> usize {
        self.chats.read().await.len()
    }
}
