//! Message-to-reply pipeline shared by every delivery mode.

use tracing::{error, info};

use crate::config::RelayConfig;
use crate::error::InferenceError;
use crate::history::ConversationStore;
use crate::inference::InferenceClient;
use crate::prompt::Prompt;
use crate::reply::truncate_for_telegram;

/// Turns an incoming chat message into the text to send back.
pub struct Relay {
    client: InferenceClient,
    history: ConversationStore,
    system_prompt: Option<String>,
    fallback_reply: String,
}

impl Relay {
    /// Build a relay from configuration.
    pub fn new(config: &RelayConfig) -> Result<Self, InferenceError> {
        Ok(Self {
            client: InferenceClient::new(&config.inference)?,
            history: ConversationStore::new(config.history_turns),
            system_prompt: config.system_prompt.clone(),
            fallback_reply: config.fallback_reply.clone(),
        })
    }

    /// The inference client.
    pub fn client(&self) -> &InferenceClient {
        &self.client
    }

    /// The conversation store.
    pub fn history(&self) -> &ConversationStore {
        &self.history
    }

    /// Text sent when generation fails.
    pub fn fallback_reply(&self) -> &str {
        &self.fallback_reply
    }

    /// Produce a reply for `text` sent in `chat_id`.
    ///
    /// Never fails: generation errors are logged and the fallback reply is
    /// returned instead. Only successful exchanges are remembered.
    pub async fn respond(&self, chat_id: i64, text: &str) -> String {
        let prompt = Prompt::new(text)
            .with_system(self.system_prompt.clone())
            .with_history(self.history.history(chat_id).await);

        match self.client.generate(&prompt).await {
            Ok(reply) => {
                let reply = truncate_for_telegram(&reply);
                self.history.record(chat_id, text, &reply).await;
                info!(chat_id = %chat_id, reply_chars = reply.chars().count(), "Generated reply");
                reply
            }
            Err(e) => {
                error!(chat_id = %chat_id, error = %e, "Generation failed, sending fallback reply");
                self.fallback_reply.clone()
            }
        }
    }

    /// Forget a chat's history. Returns whether anything was stored.
    pub async fn reset(&self, chat_id: i64) -> bool {
        self.history.clear(chat_id).await
    }
}
