//! Request and response types for `/api/embed` and the legacy `/api/embeddings`.

use ollama_forge_macros::FromBytes;
use serde::{Deserialize, Serialize};

use crate::types::ModelOptions;

/// Text to embed: one string or a batch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum EmbedInput {
    Single(String),
    Batch(Vec<String>),
}

impl EmbedInput {
    pub fn len(&self) -> usize {
        match self {
            EmbedInput::Single(_) => 1,
            EmbedInput::Batch(inputs) => inputs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for EmbedInput {
    fn from(value: String) -> Self {
        EmbedInput::Single(value)
    }
}

impl From<&str> for EmbedInput {
    fn from(value: &str) -> Self {
        EmbedInput::Single(value.to_string())
    }
}

impl From<Vec<String>> for EmbedInput {
    fn from(value: Vec<String>) -> Self {
        EmbedInput::Batch(value)
    }
}

/// Body of `POST /api/embed`.
#[derive(Serialize, Debug, Clone)]
pub struct EmbedRequest {
    pub model: String,
    pub input: EmbedInput,
    /// Truncate inputs that exceed the context length instead of failing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ModelOptions>,
}

impl EmbedRequest {
    pub fn new(model: impl Into<String>, input: impl Into<EmbedInput>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            truncate: None,
            keep_alive: None,
            options: None,
        }
    }

    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = Some(truncate);
        self
    }

    pub fn keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }

    pub fn options(mut self, options: ModelOptions) -> Self {
        self.options = Some(options);
        self
    }
}

#[derive(Deserialize, Serialize, Default, FromBytes, Debug, Clone, PartialEq)]
pub struct EmbedResponse {
    #[serde(default)]
    pub model: String,
    /// One vector per input, in input order.
    pub embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub load_duration: u64,
    #[serde(default)]
    pub prompt_eval_count: u64,
}

impl EmbedResponse {
    /// The vector for the first input, if the server returned any.
    pub fn first(&self) -> Option<&[f32]> {
        self.embeddings.first().map(Vec::as_slice)
    }
}

/// Body of the legacy `POST /api/embeddings`.
#[derive(Serialize, Debug, Clone)]
pub struct EmbeddingsRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ModelOptions>,
}

impl EmbeddingsRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            keep_alive: None,
            options: None,
        }
    }
}

#[derive(Deserialize, Serialize, Default, FromBytes, Debug, Clone, PartialEq)]
pub struct EmbeddingsResponse {
    pub embedding: Vec<f32>,
}
