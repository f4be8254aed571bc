use ollama_forge_macros::FromBytes;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    #[default]
    User,
    Assistant,
    Tool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Thinking {
    Boolean(bool),
    Level(ThinkingLevel),
}

impl Default for Thinking {
    fn default() -> Self {
        Self::Boolean(false)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ThinkingLevel {
    High,
    Medium,
    Low,
}

/// Body the server sends instead of the expected payload when a request fails.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OllamaError {
    pub error: String,
}

/// Runtime parameters for the model (`options` in generate, chat and embed requests).
///
/// The common knobs are typed; anything else the server understands can be
/// passed through [`extra`](ModelOptions::extra).
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct ModelOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Higher values make sampling more random.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,
    /// Generation stops as soon as one of these strings is produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Size of the context window in tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    /// Maximum number of tokens to generate; `-1` means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ModelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn num_ctx(mut self, num_ctx: u32) -> Self {
        self.num_ctx = Some(num_ctx);
        self
    }

    pub fn num_predict(mut self, num_predict: i32) -> Self {
        self.num_predict = Some(num_predict);
        self
    }

    pub fn stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Sets an option that has no typed field.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Response of `GET /api/version`.
#[derive(Serialize, Deserialize, Default, FromBytes, Debug, Clone)]
pub struct VersionResponse {
    pub version: String,
}

/// Outcome of [`OllamaClient::ping`](crate::OllamaClient::ping).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerStatus {
    Running { version: String },
    /// The server could not be reached or did not answer like Ollama.
    NotRunning { reason: String },
}

impl ServerStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, ServerStatus::Running { .. })
    }
}
