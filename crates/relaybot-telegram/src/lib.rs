//! Telegram front end for Relaybot.
//!
//! This crate connects Telegram to the relay in `relaybot-core`: every text
//! message is forwarded to a hosted language model and the generated text
//! is sent back to the chat.
//!
//! # Delivery modes
//!
//! - `polling` - teloxide long polling (no public URL needed)
//! - `webhook` - teloxide's built-in webhook listener
//! - `raw-webhook` - a plain axum server that answers updates and calls
//!   `sendMessage` directly
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_TOKEN`: Bot token from @BotFather
//!
//! Optional:
//! - `HF_TOKEN`: Token for the inference host
//! - `INFERENCE_URLS`: Comma-separated model URLs tried in order
//! - `HISTORY_TURNS`: Remembered turns per chat (default: 0)
//! - `WEBHOOK_URL`: Public URL for webhook modes
//! - `PORT`: Webhook port (default: 10000)
//!
//! See `relaybot_core::config` for the full list.
//!
//! # Example
//!
//! ```no_run
//! use relaybot_core::RelayConfig;
//! use relaybot_telegram::{DeliveryMode, RelayBot};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RelayConfig::from_env()?;
//!     let bot = RelayBot::new(config)?;
//!
//!     // Polling is the simplest mode; no public URL needed.
//!     bot.start(DeliveryMode::Polling).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Commands
//!
//! - `/start` - Greeting
//! - `/help` - Show available commands
//! - `/reset` - Forget the conversation so far

pub mod bot;
pub mod error;
pub mod handlers;
pub mod sender;
pub mod update;
pub mod webhook;

pub use bot::{DeliveryMode, RelayBot};
pub use error::{Result, TelegramError, WebhookError};
pub use handlers::{classify, command_reply, Command, TextKind};
pub use sender::{BotApiSender, ReplySender};
pub use update::IncomingUpdate;
pub use webhook::{create_router, serve, WebhookState};
