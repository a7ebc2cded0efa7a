//! HTTP client that walks the configured endpoint list.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::prompt::Prompt;
use crate::reply::clean_completion;

use super::payload::{
    chat_body, cold_start_hint, parse_chat_completion, parse_text_generation,
    text_generation_body, GenerationParams, InferenceApi,
};
use super::retry::RetryPolicy;

/// Client for one or more hosted inference endpoints.
///
/// Endpoints are tried in order. A 503 means the model is still loading:
/// the same URL is retried after a delay. Any other failure falls through
/// to the next URL.
#[derive(Clone)]
pub struct InferenceClient {
    client: reqwest::Client,
    urls: Vec<String>,
    api: InferenceApi,
    model: String,
    token: Option<String>,
    params: GenerationParams,
    retry: RetryPolicy,
}

impl InferenceClient {
    /// Create a client from configuration.
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            urls: config.urls.clone(),
            api: config.api,
            model: config.model.clone(),
            token: config.token.clone(),
            params: GenerationParams {
                max_new_tokens: config.max_new_tokens,
                temperature: config.temperature,
            },
            retry: config.retry,
        })
    }

    /// Model URLs in the order they are tried.
    pub fn endpoints(&self) -> &[String] {
        &self.urls
    }

    /// Payload dialect in use.
    pub fn api(&self) -> InferenceApi {
        self.api
    }

    /// Generate a reply, falling back across endpoints.
    pub async fn generate(&self, prompt: &Prompt) -> Result<String, InferenceError> {
        if self.urls.is_empty() {
            return Err(InferenceError::NoEndpoints);
        }

        let prompt_text = prompt.to_text();
        let body = match self.api {
            InferenceApi::TextGeneration => text_generation_body(&prompt_text, &self.params),
            InferenceApi::ChatCompletions => {
                chat_body(&self.model, prompt.to_messages(), &self.params)?
            }
        };

        // Only a rendered transcript can come back echoed. A bare prompt is
        // the user's own words, which a reply may legitimately start with.
        let echo = match self.api {
            InferenceApi::TextGeneration if !prompt.is_bare() => prompt_text.as_str(),
            _ => "",
        };

        let mut last_error = InferenceError::NoEndpoints;
        for (index, url) in self.urls.iter().enumerate() {
            match self.try_endpoint(url, &body, echo).await {
                Ok(text) => {
                    info!(url = %url, position = index + 1, "Inference succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(
                        url = %url,
                        position = index + 1,
                        total = self.urls.len(),
                        error = %e,
                        "Inference endpoint failed"
                    );
                    last_error = e;
                }
            }
        }

        Err(InferenceError::AllEndpointsFailed {
            tried: self.urls.len(),
            last: Box::new(last_error),
        })
    }

    async fn try_endpoint(
        &self,
        url: &str,
        body: &Value,
        echo: &str,
    ) -> Result<String, InferenceError> {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 1;

        loop {
            let mut request = self.client.post(url).json(body);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            debug!(url = %url, attempt, "Sending inference request");
            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::SERVICE_UNAVAILABLE {
                let details: Value = response.json().await.unwrap_or(Value::Null);
                if attempt >= max_attempts {
                    return Err(InferenceError::ColdStart {
                        url: url.to_string(),
                        attempts: attempt,
                    });
                }

                let delay = self.retry.delay_for(attempt, cold_start_hint(&details));
                info!(
                    url = %url,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Model is loading, retrying after delay"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(InferenceError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                    body: text,
                });
            }

            let json: Value = response
                .json()
                .await
                .map_err(|e| InferenceError::Parse(e.to_string()))?;

            let generated = match self.api {
                InferenceApi::TextGeneration => parse_text_generation(&json)?,
                InferenceApi::ChatCompletions => parse_chat_completion(&json)?,
            };

            return clean_completion(echo, &generated).ok_or(InferenceError::EmptyCompletion);
        }
    }
}
