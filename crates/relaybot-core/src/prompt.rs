//! Prompt assembly from the incoming message and remembered turns.

use crate::history::{Role, Turn};
use crate::inference::ChatMessage;

const USER_LABEL: &str = "User";
const ASSISTANT_LABEL: &str = "Assistant";

/// Everything the model sees for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Optional persona.
    pub system: Option<String>,
    /// Earlier turns, oldest first.
    pub history: Vec<Turn>,
    /// The message being answered.
    pub message: String,
}

impl Prompt {
    /// A prompt with no persona and no history.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            system: None,
            history: Vec::new(),
            message: message.into(),
        }
    }

    /// Sets the persona.
    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system;
        self
    }

    /// Sets the earlier turns.
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    /// Whether this prompt is just the raw message.
    pub fn is_bare(&self) -> bool {
        self.system.is_none() && self.history.is_empty()
    }

    /// Flatten into a single text-generation input.
    ///
    /// A bare prompt is sent verbatim. Otherwise turns are rendered as
    /// labelled lines ending with an open assistant cue.
    pub fn to_text(&self) -> String {
        if self.is_bare() {
            return self.message.clone();
        }

        let mut text = String::new();
        if let Some(system) = &self.system {
            text.push_str(system);
            text.push_str("\n\n");
        }
        for turn in &self.history {
            let label = match turn.role {
                Role::User => USER_LABEL,
                Role::Assistant => ASSISTANT_LABEL,
            };
            text.push_str(&format!("{}: {}\n", label, turn.text));
        }
        text.push_str(&format!("{}: {}\n{}:", USER_LABEL, self.message, ASSISTANT_LABEL));
        text
    }

    /// Convert into chat-completions messages.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        if let Some(system) = &self.system {
            messages.push(ChatMessage::system(system));
        }
        for turn in &self.history {
            messages.push(match turn.role {
                Role::User => ChatMessage::user(&turn.text),
                Role::Assistant => ChatMessage::assistant(&turn.text),
            });
        }
        messages.push(ChatMessage::user(&self.message));
        messages
    }
}

/// Marker that starts a hallucinated user turn inside a completion.
pub(crate) fn user_turn_marker() -> String {
    format!("\n{}:", USER_LABEL)
}
