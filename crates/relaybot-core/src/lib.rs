//! Core logic for Relaybot.
//!
//! Relaybot forwards Telegram messages to a hosted language model and sends
//! the generated text back. This crate holds everything that does not
//! depend on how updates arrive:
//!
//! - [`config`]: environment-driven configuration
//! - [`inference`]: endpoint client with ordered fallback and cold-start retry
//! - [`history`]: optional short-term memory per chat
//! - [`prompt`] and [`reply`]: prompt assembly and completion cleanup
//! - [`relay`]: the message-to-reply pipeline used by every delivery mode

pub mod config;
pub mod error;
pub mod history;
pub mod inference;
pub mod prompt;
pub mod relay;
pub mod reply;

pub use config::{parse_url_list, InferenceConfig, RelayConfig};
pub use error::{ConfigError, InferenceError, RelayError, Result};
pub use history::{ConversationStore, Role, Turn};
pub use inference::{InferenceApi, InferenceClient, RetryPolicy};
pub use prompt::Prompt;
pub use relay::Relay;
pub use reply::{clean_completion, truncate_for_telegram, TELEGRAM_MAX_MESSAGE_CHARS};
