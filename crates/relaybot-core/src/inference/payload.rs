//! Request bodies and response parsing for the supported endpoint dialects.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::InferenceError;

/// Payload dialect spoken by an inference endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InferenceApi {
    /// Hosted text-generation API: `{"inputs": ..., "parameters": {...}}`.
    #[default]
    TextGeneration,
    /// OpenAI-compatible chat completions.
    ChatCompletions,
}

impl fmt::Display for InferenceApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TextGeneration => write!(f, "text-generation"),
            Self::ChatCompletions => write!(f, "chat-completions"),
        }
    }
}

impl FromStr for InferenceApi {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text-generation" | "text_generation" | "hf" => Ok(Self::TextGeneration),
            "chat-completions" | "chat_completions" | "chat" | "openai" => {
                Ok(Self::ChatCompletions)
            }
            other => Err(format!(
                "unknown inference API '{}', expected text-generation or chat-completions",
                other
            )),
        }
    }
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Maximum tokens to generate.
    pub max_new_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// A message in a chat-completions conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: String,
    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature for generation.
    pub temperature: f32,
}

/// Build a text-generation request body.
///
/// `return_full_text` is disabled so hosts that honour it do not echo the
/// prompt back.
pub fn text_generation_body(inputs: &str, params: &GenerationParams) -> Value {
    json!({
        "inputs": inputs,
        "parameters": {
            "max_new_tokens": params.max_new_tokens,
            "temperature": params.temperature,
            "return_full_text": false
        }
    })
}

/// Build a chat-completions request body.
pub fn chat_body(
    model: &str,
    messages: Vec<ChatMessage>,
    params: &GenerationParams,
) -> Result<Value, InferenceError> {
    let request = ChatRequest {
        model: model.to_string(),
        messages,
        max_tokens: params.max_new_tokens,
        temperature: params.temperature,
    };
    serde_json::to_value(request).map_err(|e| InferenceError::Parse(e.to_string()))
}

/// Extract generated text from a text-generation response.
///
/// Hosts answer either `[{"generated_text": "..."}]` or a bare object; an
/// `{"error": "..."}` body is reported as a parse failure carrying the message.
pub fn parse_text_generation(json: &Value) -> Result<String, InferenceError> {
    let item = match json {
        Value::Array(items) => items
            .first()
            .ok_or_else(|| InferenceError::Parse("empty result array".to_string()))?,
        other => other,
    };

    if let Some(text) = item.get("generated_text").and_then(Value::as_str) {
        return Ok(text.to_string());
    }

    if let Some(error) = json.get("error").and_then(Value::as_str) {
        return Err(InferenceError::Parse(format!("endpoint error: {}", error)));
    }

    Err(InferenceError::Parse("no generated_text in response".to_string()))
}

/// Extract the assistant message from a chat-completions response.
pub fn parse_chat_completion(json: &Value) -> Result<String, InferenceError> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| InferenceError::Parse("No content in response".to_string()))
}

/// Read the host's estimate of how long the model needs to load.
///
/// Estimates too large for a `Duration` saturate; the retry policy caps them.
pub fn cold_start_hint(json: &Value) -> Option<Duration> {
    json.get("estimated_time")
        .and_then(Value::as_f64)
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::RetryPolicy;

    fn params() -> GenerationParams {
        GenerationParams {
            max_new_tokens: 50,
            temperature: 0.5,
        }
    }

    #[test]
    fn test_api_from_str() {
        assert_eq!("hf".parse::<InferenceApi>().unwrap(), InferenceApi::TextGeneration);
        assert_eq!(
            "Chat-Completions".parse::<InferenceApi>().unwrap(),
            InferenceApi::ChatCompletions
        );
        assert!("soap".parse::<InferenceApi>().is_err());
        assert_eq!(InferenceApi::ChatCompletions.to_string(), "chat-completions");
    }

    #[test]
    fn test_text_generation_body() {
        let body = text_generation_body("hello", &params());
        assert_eq!(body["inputs"], "hello");
        assert_eq!(body["parameters"]["max_new_tokens"], 50);
        assert_eq!(body["parameters"]["return_full_text"], false);
    }

    #[test]
    fn test_chat_body() {
        let body = chat_body(
            "org/model",
            vec![ChatMessage::system("be nice"), ChatMessage::user("hi")],
            &params(),
        )
        .unwrap();
        assert_eq!(body["model"], "org/model");
        assert_eq!(body["max_tokens"], 50);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_parse_text_generation_shapes() {
        let list = json!([{"generated_text": "from list"}]);
        assert_eq!(parse_text_generation(&list).unwrap(), "from list");

        let object = json!({"generated_text": "from object"});
        assert_eq!(parse_text_generation(&object).unwrap(), "from object");

        let error = json!({"error": "Model is overloaded"});
        let err = parse_text_generation(&error).unwrap_err();
        assert!(err.to_string().contains("Model is overloaded"));

        assert!(parse_text_generation(&json!([])).is_err());
        assert!(parse_text_generation(&json!({"foo": 1})).is_err());
    }

    #[test]
    fn test_parse_chat_completion() {
        let json = json!({"choices": [{"message": {"role": "assistant", "content": "Hi!"}}]});
        assert_eq!(parse_chat_completion(&json).unwrap(), "Hi!");
        assert!(parse_chat_completion(&json!({"choices": []})).is_err());
    }

    #[test]
    fn test_cold_start_hint() {
        let json = json!({"error": "Model is currently loading", "estimated_time": 20.5});
        assert_eq!(cold_start_hint(&json), Some(Duration::from_secs_f64(20.5)));
        assert_eq!(cold_start_hint(&json!({"estimated_time": -1.0})), None);
        assert_eq!(cold_start_hint(&Value::Null), None);
    }

    #[test]
    fn test_huge_cold_start_hint_saturates() {
        let hint = cold_start_hint(&json!({"error": "loading", "estimated_time": 1e30}));
        assert_eq!(hint, Some(Duration::MAX));

        let policy = RetryPolicy::new(1, Duration::from_secs(1), Duration::from_secs(60));
        assert_eq!(policy.delay_for(1, hint), Duration::from_secs(60));
    }
}
