//! Environment-driven configuration for Relaybot.
//!
//! Every knob that used to distinguish one bot script from another
//! (delivery mode, model endpoint, memory, fallback URL list) is read from
//! the environment here.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_TOKEN` (or `TELEGRAM_BOT_TOKEN`): Bot token from @BotFather
//!
//! Optional:
//! - `HF_TOKEN`: Bearer token for the inference host
//! - `INFERENCE_URLS`: Comma-separated model URLs, tried in order
//! - `INFERENCE_API`: `text-generation` (default) or `chat-completions`
//! - `INFERENCE_MODEL`: Model id for chat-completions bodies
//! - `MAX_NEW_TOKENS`, `TEMPERATURE`: Generation parameters
//! - `SYSTEM_PROMPT`: Persona prepended to every prompt
//! - `HISTORY_TURNS`: Turns remembered per chat (0 = stateless)
//! - `COLD_START_RETRIES`, `COLD_START_DELAY_SECS`, `COLD_START_MAX_DELAY_SECS`
//! - `REQUEST_TIMEOUT_SECS`: Per-request timeout for model calls
//! - `FALLBACK_REPLY`: Text sent when every endpoint fails
//! - `WEBHOOK_URL` (or `RENDER_EXTERNAL_URL`): Public URL for webhook modes
//! - `WEBHOOK_SECRET`: Secret token Telegram must echo on webhook calls
//! - `PORT`: Listen port for webhook modes (default: 10000)
//! - `TELEGRAM_API_URL`: Bot API base URL (default: https://api.telegram.org)

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::inference::{InferenceApi, RetryPolicy};

/// Environment variable for the bot token.
pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_TOKEN";

/// Alternative name for the bot token.
pub const TELEGRAM_BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable for the inference host token.
pub const HF_TOKEN_ENV: &str = "HF_TOKEN";

/// Environment variable for the ordered model URL list.
pub const INFERENCE_URLS_ENV: &str = "INFERENCE_URLS";

/// Environment variable for the public webhook URL.
pub const WEBHOOK_URL_ENV: &str = "WEBHOOK_URL";

/// URL injected by Render deployments.
pub const RENDER_EXTERNAL_URL_ENV: &str = "RENDER_EXTERNAL_URL";

/// Default model endpoint.
pub const DEFAULT_INFERENCE_URL: &str =
    "https://api-inference.huggingface.co/models/HuggingFaceH4/zephyr-7b-beta";

/// Default model id for chat-completions payloads.
pub const DEFAULT_MODEL: &str = "HuggingFaceH4/zephyr-7b-beta";

/// Default Bot API base URL.
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Default listen port for webhook modes.
pub const DEFAULT_PORT: u16 = 10000;

/// Reply sent when no endpoint produced text.
pub const DEFAULT_FALLBACK_REPLY: &str =
    "Sorry, the model is not available right now. Please try again in a minute.";

const DEFAULT_MAX_NEW_TOKENS: u32 = 200;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Settings for the inference client.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Model URLs in the order they are tried.
    pub urls: Vec<String>,
    /// Payload dialect spoken by the endpoints.
    pub api: InferenceApi,
    /// Model id (chat-completions only).
    pub model: String,
    /// Bearer token.
    pub token: Option<String>,
    /// Maximum tokens to generate.
    pub max_new_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Cold-start retry behaviour.
    pub retry: RetryPolicy,
    /// Timeout applied to every model request.
    pub request_timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            urls: vec![DEFAULT_INFERENCE_URL.to_string()],
            api: InferenceApi::default(),
            model: DEFAULT_MODEL.to_string(),
            token: None,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Complete bot configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Telegram bot token.
    pub telegram_token: String,
    /// Bot API base URL.
    pub telegram_api_url: String,
    /// Inference client settings.
    pub inference: InferenceConfig,
    /// Persona prepended to prompts.
    pub system_prompt: Option<String>,
    /// Turns remembered per chat; 0 disables memory.
    pub history_turns: usize,
    /// Text sent when generation fails.
    pub fallback_reply: String,
    /// Public URL registered with Telegram in webhook modes.
    pub webhook_url: Option<String>,
    /// Secret token expected on incoming webhook requests.
    pub webhook_secret: Option<String>,
    /// Host to bind the webhook server to.
    pub host: String,
    /// Port to bind the webhook server to.
    pub port: u16,
}

impl RelayConfig {
    /// Creates a configuration with defaults and the given token.
    pub fn new(telegram_token: impl Into<String>) -> Self {
        Self {
            telegram_token: telegram_token.into(),
            telegram_api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            inference: InferenceConfig::default(),
            system_prompt: None,
            history_turns: 0,
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
            webhook_url: None,
            webhook_secret: None,
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }

    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = get(TELEGRAM_TOKEN_ENV)
            .or_else(|| get(TELEGRAM_BOT_TOKEN_ENV))
            .ok_or(ConfigError::MissingVar(TELEGRAM_TOKEN_ENV))?;

        let mut config = Self::new(token);

        if let Some(api_url) = get("TELEGRAM_API_URL") {
            config.telegram_api_url = api_url.trim_end_matches('/').to_string();
        }

        let inference = &mut config.inference;
        inference.token = get(HF_TOKEN_ENV);
        if let Some(raw) = get(INFERENCE_URLS_ENV) {
            let urls = parse_url_list(&raw);
            if urls.is_empty() {
                return Err(ConfigError::Invalid {
                    var: INFERENCE_URLS_ENV,
                    reason: "no URLs in list".to_string(),
                });
            }
            inference.urls = urls;
        }
        if let Some(api) = get("INFERENCE_API") {
            inference.api = api.parse().map_err(|reason| ConfigError::Invalid {
                var: "INFERENCE_API",
                reason,
            })?;
        }
        if let Some(model) = get("INFERENCE_MODEL") {
            inference.model = model;
        }
        if let Some(v) = get("MAX_NEW_TOKENS") {
            inference.max_new_tokens = parse_var("MAX_NEW_TOKENS", &v)?;
        }
        if let Some(v) = get("TEMPERATURE") {
            inference.temperature = parse_var("TEMPERATURE", &v)?;
        }
        if let Some(v) = get("COLD_START_RETRIES") {
            inference.retry.cold_start_retries = parse_var("COLD_START_RETRIES", &v)?;
        }
        if let Some(v) = get("COLD_START_DELAY_SECS") {
            inference.retry.base_delay =
                Duration::from_secs(parse_var("COLD_START_DELAY_SECS", &v)?);
        }
        if let Some(v) = get("COLD_START_MAX_DELAY_SECS") {
            inference.retry.max_delay =
                Duration::from_secs(parse_var("COLD_START_MAX_DELAY_SECS", &v)?);
        }
        if let Some(v) = get("REQUEST_TIMEOUT_SECS") {
            inference.request_timeout =
                Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", &v)?);
        }

        config.system_prompt = get("SYSTEM_PROMPT");
        if let Some(v) = get("HISTORY_TURNS") {
            config.history_turns = parse_var("HISTORY_TURNS", &v)?;
        }
        if let Some(reply) = get("FALLBACK_REPLY") {
            config.fallback_reply = reply;
        }
        config.webhook_url = get(WEBHOOK_URL_ENV).or_else(|| get(RENDER_EXTERNAL_URL_ENV));
        config.webhook_secret = get("WEBHOOK_SECRET");
        if let Some(v) = get("PORT") {
            config.port = parse_var("PORT", &v)?;
        }

        Ok(config)
    }

    /// Overrides the listen port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the model URL list.
    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.inference.urls = urls;
        self
    }

    /// Overrides the number of remembered turns.
    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }

    /// Overrides the Bot API base URL.
    pub fn with_telegram_api_url(mut self, url: impl Into<String>) -> Self {
        self.telegram_api_url = url.into();
        self
    }

    /// Returns the bind address for webhook modes.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split a comma-separated URL list, keeping order and dropping blanks and
/// repeated entries.
pub fn parse_url_list(raw: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for url in raw.split(',').map(str::trim).filter(|u| !u.is_empty()) {
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}
