use std::collections::HashMap;

use ollama_forge_macros::FromBytes;
use serde::{Deserialize, Serialize};

use crate::parser::StreamEventExt;
use crate::stream::ResponseStream;
use crate::types::chat::ChatRequestMessage;

/// Response of `GET /api/tags`: models available locally.
#[derive(Deserialize, Serialize, Default, FromBytes, Debug, Clone)]
pub struct ListModelsResponse {
    pub models: Vec<OllamaModel>,
}

impl ListModelsResponse {
    /// Whether `name` is installed. A name without a tag matches `:latest`.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// The installed model called `name`, with the same tag rules as [`contains`](Self::contains).
    pub fn find(&self, name: &str) -> Option<&OllamaModel> {
        let wanted = with_default_tag(name);
        self.models
            .iter()
            .find(|m| m.name == name || with_default_tag(&m.name) == wanted)
    }

    /// Models whose name contains `query`, ignoring case.
    pub fn filter(&self, query: &str) -> Vec<&OllamaModel> {
        let query = query.to_lowercase();
        self.models
            .iter()
            .filter(|m| m.name.to_lowercase().contains(&query))
            .collect()
    }
}

fn with_default_tag(name: &str) -> String {
    if name.contains(':') {
        name.to_string()
    } else {
        format!("{}:latest", name)
    }
}

#[derive(Deserialize, Default, Serialize, Debug, Clone)]
pub struct OllamaModel {
    pub name: String,
    #[serde(default)]
    pub model: String,
    /// ISO 8601 timestamp.
    #[serde(default)]
    pub modified_at: String,
    /// Size on disk in bytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub details: ModelDetails,
}

#[derive(Deserialize, Default, Serialize, Debug, Clone)]
pub struct ModelDetails {
    #[serde(default)]
    pub parent_model: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub families: Option<Vec<String>>,
    /// e.g. `"7B"`.
    #[serde(default)]
    pub parameter_size: String,
    /// e.g. `"Q4_0"`.
    #[serde(default)]
    pub quantization_level: String,
}

/// Response of `GET /api/ps`: models currently loaded in memory.
#[derive(Deserialize, Serialize, Default, FromBytes, Debug, Clone)]
pub struct ListRunningModelsResponse {
    pub models: Vec<OllamaRunningModel>,
}

#[derive(Deserialize, Serialize, Default, Debug, Clone)]
pub struct OllamaRunningModel {
    #[serde(default)]
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub details: ModelDetails,
    /// When the model will be unloaded (ISO 8601).
    #[serde(default)]
    pub expires_at: String,
    #[serde(default)]
    pub size_vram: u64,
    #[serde(default)]
    pub context_length: u32,
}

/// Body of `POST /api/show`.
#[derive(Serialize, Debug, Clone)]
pub struct ShowModelRequest {
    pub model: String,
    /// Include the full tensor and tokenizer metadata.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub verbose: bool,
}

impl ShowModelRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            verbose: false,
        }
    }
}

#[derive(Deserialize, Serialize, Default, FromBytes, Debug, Clone)]
pub struct ShowModelResponse {
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub modelfile: String,
    #[serde(default)]
    pub parameters: String,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub details: ModelDetails,
    #[serde(default)]
    pub model_info: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Body of `POST /api/pull`.
#[derive(Serialize, Debug, Clone)]
pub struct PullModelRequest {
    pub model: String,
    /// Allow registries without valid TLS.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
    pub stream: bool,
}

impl PullModelRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            insecure: false,
            stream: false,
        }
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }
}

/// Body of `POST /api/push`. The model name must include the namespace,
/// e.g. `myuser/mymodel:latest`.
#[derive(Serialize, Debug, Clone)]
pub struct PushModelRequest {
    pub model: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
    pub stream: bool,
}

impl PushModelRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            insecure: false,
            stream: false,
        }
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }
}

/// Body of `POST /api/create`: derive a new model from an existing one.
#[derive(Serialize, Default, Debug, Clone)]
pub struct CreateModelRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatRequestMessage>>,
    /// Quantisation to apply to a non-quantised source, e.g. `"q4_K_M"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantize: Option<String>,
    pub stream: bool,
}

impl CreateModelRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn from_model(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters
            .get_or_insert_with(Default::default)
            .insert(key.into(), value.into());
        self
    }

    pub fn quantize(mut self, quantize: impl Into<String>) -> Self {
        self.quantize = Some(quantize.into());
        self
    }
}

/// Body of `POST /api/copy`.
#[derive(Serialize, Debug, Clone)]
pub struct CopyModelRequest {
    pub source: String,
    pub destination: String,
}

/// Body of `DELETE /api/delete`.
#[derive(Serialize, Debug, Clone)]
pub struct DeleteModelRequest {
    pub model: String,
}

/// Status line emitted by pull, push and create.
#[derive(Deserialize, Serialize, Default, FromBytes, Debug, Clone, PartialEq)]
pub struct ProgressResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Bytes to transfer for the current layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<u64>,
}

impl ProgressResponse {
    /// Completed share of the current layer in `0.0..=1.0`, when the server
    /// reported a non-zero total.
    pub fn fraction(&self) -> Option<f64> {
        let total = self.total.filter(|t| *t > 0)?;
        let completed = self.completed.unwrap_or(0).min(total);
        Some(completed as f64 / total as f64)
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Represents an event received from a streaming pull, push or create response.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ProgressStreamEvent {
    Progress(ProgressResponse),
    Error(String),
    Partial {
        partial: String,
        error: Option<String>,
    },
}

pub type ProgressStream = ResponseStream<ProgressStreamEvent>;

impl StreamEventExt<ProgressResponse> for ProgressStreamEvent {
    fn from_message(msg: ProgressResponse) -> Self {
        ProgressStreamEvent::Progress(msg)
    }

    fn from_error(err: String) -> Self {
        ProgressStreamEvent::Error(err)
    }

    fn partial(partial: String, error: Option<String>) -> Self {
        ProgressStreamEvent::Partial { partial, error }
    }
}
