//! Main Telegram bot implementation.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use relaybot_core::{Relay, RelayConfig};
use teloxide::dispatching::{DefaultKey, UpdateFilterExt, UpdateHandler};
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use teloxide::RequestError;
use tracing::{info, warn};

use crate::error::{Result, TelegramError};
use crate::handlers::{handle_command, handle_message, handle_unknown_command, Command};
use crate::sender::BotApiSender;
use crate::webhook::{self, WebhookState};

/// How updates reach the bot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DeliveryMode {
    /// Long polling through the bot framework.
    #[default]
    Polling,
    /// Webhook managed by the bot framework.
    Webhook,
    /// Our own HTTP server answering updates directly.
    RawWebhook,
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polling => write!(f, "polling"),
            Self::Webhook => write!(f, "webhook"),
            Self::RawWebhook => write!(f, "raw-webhook"),
        }
    }
}

/// The Telegram bot for Relaybot.
pub struct RelayBot {
    /// The teloxide bot instance.
    bot: Bot,
    /// Message-to-reply pipeline shared by all handlers.
    relay: Arc<Relay>,
    /// Loaded configuration.
    config: RelayConfig,
}

impl RelayBot {
    /// Create a new bot from configuration.
    pub fn new(config: RelayConfig) -> Result<Self> {
        let relay = Relay::new(&config)?;
        let api_url: url::Url = config.telegram_api_url.parse()?;
        let bot = Bot::new(&config.telegram_token).set_api_url(api_url);

        Ok(Self {
            bot,
            relay: Arc::new(relay),
            config,
        })
    }

    /// The shared relay.
    pub fn relay(&self) -> Arc<Relay> {
        Arc::clone(&self.relay)
    }

    /// The loaded configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Start in the given delivery mode.
    pub async fn start(&self, mode: DeliveryMode) -> Result<()> {
        info!(
            mode = %mode,
            endpoints = self.relay.client().endpoints().len(),
            api = %self.relay.client().api(),
            history_turns = self.config.history_turns,
            "Starting Telegram bot"
        );

        match mode {
            DeliveryMode::Polling => self.start_polling().await,
            DeliveryMode::Webhook => self.start_webhook().await,
            DeliveryMode::RawWebhook => self.start_raw_webhook().await,
        }
    }

    /// Start the bot in polling mode.
    pub async fn start_polling(&self) -> Result<()> {
        info!("Starting Telegram bot in polling mode. Send /start to begin.");
        self.dispatcher().dispatch().await;
        Ok(())
    }

    /// Start with the framework-managed webhook listener.
    pub async fn start_webhook(&self) -> Result<()> {
        let webhook_url = self
            .config
            .webhook_url
            .as_deref()
            .ok_or(TelegramError::NoWebhookUrl)?;
        let url: url::Url = webhook_url.parse()?;
        let addr: SocketAddr = self.config.bind_address().parse()?;

        let mut options = webhooks::Options::new(addr, url);
        if let Some(secret) = &self.config.webhook_secret {
            options = options.secret_token(secret.clone());
        }

        info!(addr = %addr, url = %webhook_url, "Starting Telegram bot with webhook...");
        let listener = webhooks::axum(self.bot.clone(), options)
            .await
            .map_err(|e| TelegramError::WebhookFailed(e.to_string()))?;

        self.dispatcher()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
        Ok(())
    }

    /// Start our own HTTP server and answer updates without the framework.
    pub async fn start_raw_webhook(&self) -> Result<()> {
        let sender = BotApiSender::new(&self.config.telegram_api_url, &self.config.telegram_token);

        match self.config.webhook_url.as_deref() {
            Some(url) => {
                sender
                    .set_webhook(url, self.config.webhook_secret.as_deref())
                    .await?;
            }
            None => warn!("WEBHOOK_URL not set; assuming the webhook is already registered"),
        }

        let state = WebhookState::new(
            self.relay(),
            Arc::new(sender),
            self.config.webhook_secret.clone(),
        );
        webhook::serve(&self.config.bind_address(), state).await?;
        Ok(())
    }

    fn dispatcher(&self) -> Dispatcher<Bot, RequestError, DefaultKey> {
        Dispatcher::builder(self.bot.clone(), schema(self.relay()))
            .default_handler(|upd| async move {
                warn!("Unhandled update: {:?}", upd);
            })
            .enable_ctrlc_handler()
            .build()
    }
}

/// Handler tree for the framework delivery modes.
fn schema(relay: Arc<Relay>) -> UpdateHandler<RequestError> {
    let relay_for_commands = Arc::clone(&relay);
    let relay_for_messages = Arc::clone(&relay);

    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                    let relay = Arc::clone(&relay_for_commands);
                    info!(chat_id = %msg.chat.id, "Command matched: {:?}", cmd);
                    async move { handle_command(bot, msg, cmd, relay).await }
                }),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| {
                    msg.text()
                        .map(|t| t.starts_with('/'))
                        .unwrap_or(false)
                })
                .endpoint(|bot: Bot, msg: Message| async move {
                    handle_unknown_command(bot, msg).await
                }),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().is_some())
                .endpoint(move |bot: Bot, msg: Message| {
                    let relay = Arc::clone(&relay_for_messages);
                    info!(chat_id = %msg.chat.id, "Regular message received");
                    async move { handle_message(bot, msg, relay).await }
                }),
        )
}
