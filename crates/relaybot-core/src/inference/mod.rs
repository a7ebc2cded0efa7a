//! Hosted model inference.
//!
//! # Fallback order
//!
//! Endpoints are configured as an ordered URL list. For each URL:
//! 1. **2xx** - parse the completion; a non-empty result ends the search
//! 2. **503** - the model is cold; sleep and retry the same URL
//! 3. **anything else** - log and move to the next URL
//!
//! When the list runs out the caller gets `AllEndpointsFailed`.

mod client;
mod payload;
mod retry;

pub use self::client::InferenceClient;
pub use self::payload::{
    chat_body, cold_start_hint, parse_chat_completion, parse_text_generation,
    text_generation_body, ChatMessage, ChatRequest, GenerationParams, InferenceApi,
};
pub use self::retry::RetryPolicy;
