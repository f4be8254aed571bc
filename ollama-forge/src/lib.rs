use std::sync::Arc;

use thiserror::Error;

use self::fallback::FallbackPolicy;
use self::retry::RetryPolicy;
use self::transport::Transport;
use self::types::OllamaError;

pub mod blocking;
pub mod builder;
pub mod client;
pub mod config;
pub mod embedding;
pub mod fallback;
pub mod parser;
pub mod retry;
pub mod stream;
pub mod transport;
pub mod types;

/// Async client for the Ollama REST API.
///
/// Cheap to clone; every clone shares the same transport. Build one with
/// [`OllamaClient::builder`].
#[derive(Clone)]
pub struct OllamaClient {
    transport: Arc<dyn Transport + Send + Sync>,
    retry: RetryPolicy,
    fallback: FallbackPolicy,
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Client error: {0}")]
    Client(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Stream cancelled")]
    Cancelled,
}

impl Error {
    /// Maps a non-success HTTP status and its body to a typed error.
    ///
    /// The message is the body's `error` field when the server sent an
    /// [`OllamaError`], otherwise the raw body text.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = match serde_json::from_slice::<OllamaError>(body) {
            Ok(err) => err.error,
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                if text.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    text
                }
            }
        };

        match status {
            400 | 422 => Error::InvalidRequest(message),
            404 => Error::ModelNotFound(message),
            500..=599 => Error::Server { status, message },
            _ => Error::Api { status, message },
        }
    }

    /// Classifies a `reqwest` failure that happened while sending a request or
    /// reading its body. A connection the server dropped or reset counts as
    /// [`Error::Connection`].
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() || err.is_body() {
            Error::Connection(err.to_string())
        } else {
            Error::Transport(err)
        }
    }

    /// Transient failures that are worth repeating against the same model.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Connection(_) | Error::Timeout(_) | Error::Server { .. }
        )
    }

    /// Failures after which a backup model may still succeed.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(
            self,
            Error::ModelNotFound(_) | Error::Server { .. } | Error::Api { .. }
        )
    }
}
