//! Error types for the relay core.

use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("{0} not set. Set it in the environment or in a .env file.")]
    MissingVar(&'static str),

    /// A variable is set but its value cannot be used.
    #[error("invalid value for {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Errors that can occur when calling inference endpoints.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// No endpoint URLs were configured.
    #[error("no inference endpoints configured")]
    NoEndpoints,

    /// The endpoint kept answering 503 while the model was loading.
    #[error("model at {url} still loading after {attempts} attempts")]
    ColdStart {
        /// Endpoint URL.
        url: String,
        /// Number of requests made to this URL.
        attempts: u32,
    },

    /// The endpoint answered with a non-success status.
    #[error("endpoint {url} returned {status}: {body}")]
    Status {
        /// Endpoint URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The response body did not have the expected shape.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The model answered with nothing usable.
    #[error("model returned an empty completion")]
    EmptyCompletion,

    /// Every configured endpoint failed.
    #[error("all {tried} inference endpoints failed, last error: {last}")]
    AllEndpointsFailed {
        /// Number of endpoints tried.
        tried: usize,
        /// The error from the last endpoint.
        last: Box<InferenceError>,
    },
}

impl InferenceError {
    /// Whether this failure is the retryable cold-start status.
    pub fn is_cold_start(&self) -> bool {
        match self {
            InferenceError::ColdStart { .. } => true,
            InferenceError::Status { status, .. } => *status == 503,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for InferenceError {
    fn from(e: reqwest::Error) -> Self {
        // Endpoint URLs may carry keys in the query string.
        InferenceError::Request(e.without_url().to_string())
    }
}

/// Top-level error for relay operations.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Inference error.
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
