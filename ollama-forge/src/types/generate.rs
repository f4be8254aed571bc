//! Contains all data structures that are particularly used for Ollama Generate API

use ollama_forge_macros::FromBytes;
use serde::{Deserialize, Serialize};

use crate::parser::StreamEventExt;
use crate::stream::{ResponseStream, TextChunk};
use crate::types::{ModelOptions, Thinking, ThinkingLevel};

/// Body of `POST /api/generate`.
///
/// Usually built through [`SimpleGenerateRequest`] or [`StreamingGenerateRequest`],
/// which pin the `stream` flag to match the client method they are passed to.
#[derive(Serialize, Default, Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Text placed after the model response, for fill-in-the-middle models.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Base64-encoded images for multimodal models.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// `"json"` or a JSON schema the response must follow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<serde_json::Value>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub think: Option<Thinking>,
    /// Send the prompt verbatim, bypassing the model's template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,
    /// How long the model stays loaded after the request, e.g. `"5m"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
    /// Context returned by a previous response, for short conversational memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ModelOptions>,
}

/// One generation result; a whole answer, or a single chunk when streaming.
#[derive(Deserialize, Serialize, Default, FromBytes, Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub thinking: String,
    #[serde(default)]
    pub done: bool,
    /// Why generation stopped, e.g. `"stop"` or `"length"`.
    #[serde(default)]
    pub done_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<i64>>,
    // Durations are in nanoseconds.
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub load_duration: u64,
    #[serde(default)]
    pub prompt_eval_count: u64,
    #[serde(default)]
    pub prompt_eval_duration: u64,
    #[serde(default)]
    pub eval_count: u64,
    #[serde(default)]
    pub eval_duration: u64,
}

macro_rules! generate_request_variant {
    ($(#[$meta:meta])* $name:ident, stream = $stream:expr) => {
        $(#[$meta])*
        #[derive(Default, Debug, Clone)]
        pub struct $name {
            pub model: String,
            pub prompt: Option<String>,
            pub suffix: Option<String>,
            pub images: Option<Vec<String>>,
            pub system: Option<String>,
            pub format: Option<serde_json::Value>,
            pub think: Option<Thinking>,
            pub raw: Option<bool>,
            pub keep_alive: Option<String>,
            pub context: Option<Vec<i64>>,
            pub options: Option<ModelOptions>,
        }

        impl $name {
            pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
                Self {
                    model: model.into(),
                    prompt: Some(prompt.into()),
                    ..Default::default()
                }
            }

            pub fn system(mut self, system: impl Into<String>) -> Self {
                self.system = Some(system.into());
                self
            }

            pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
                self.suffix = Some(suffix.into());
                self
            }

            /// Each image should be a Base64-encoded string.
            pub fn images(mut self, images: Vec<String>) -> Self {
                self.images = Some(images);
                self
            }

            pub fn format(mut self, format: serde_json::Value) -> Self {
                self.format = Some(format);
                self
            }

            pub fn raw(mut self, raw: bool) -> Self {
                self.raw = Some(raw);
                self
            }

            pub fn keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
                self.keep_alive = Some(keep_alive.into());
                self
            }

            pub fn context(mut self, context: Vec<i64>) -> Self {
                self.context = Some(context);
                self
            }

            pub fn options(mut self, options: ModelOptions) -> Self {
                self.options = Some(options);
                self
            }

            pub fn enable_thinking(mut self) -> Self {
                self.think = Some(Thinking::Boolean(true));
                self
            }

            pub fn disable_thinking(mut self) -> Self {
                self.think = Some(Thinking::Boolean(false));
                self
            }

            pub fn set_thinking_level(mut self, level: ThinkingLevel) -> Self {
                self.think = Some(Thinking::Level(level));
                self
            }
        }

        impl From<$name> for GenerateRequest {
            fn from(request: $name) -> GenerateRequest {
                GenerateRequest {
                    model: request.model,
                    prompt: request.prompt,
                    suffix: request.suffix,
                    images: request.images,
                    system: request.system,
                    format: request.format,
                    stream: $stream,
                    think: request.think,
                    raw: request.raw,
                    keep_alive: request.keep_alive,
                    context: request.context,
                    options: request.options,
                }
            }
        }
    };
}

generate_request_variant!(
    /// A generation request answered with a single [`GenerateResponse`].
    SimpleGenerateRequest,
    stream = false
);

generate_request_variant!(
    /// A generation request answered with a [`GenerateStream`].
    StreamingGenerateRequest,
    stream = true
);

/// Represents an event received from a streaming generation response.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum GenerateStreamEvent {
    MessageChunk(GenerateResponse),
    /// The server reported an error in-band.
    Error(String),
    /// A line that could not be decoded.
    Partial {
        partial: String,
        error: Option<String>,
    },
}

pub type GenerateStream = ResponseStream<GenerateStreamEvent>;

impl StreamEventExt<GenerateResponse> for GenerateStreamEvent {
    fn from_message(msg: GenerateResponse) -> Self {
        GenerateStreamEvent::MessageChunk(msg)
    }

    fn from_error(err: String) -> Self {
        GenerateStreamEvent::Error(err)
    }

    fn partial(partial: String, error: Option<String>) -> Self {
        GenerateStreamEvent::Partial { partial, error }
    }
}

impl TextChunk for GenerateStreamEvent {
    fn text(&self) -> Option<&str> {
        match self {
            GenerateStreamEvent::MessageChunk(chunk) => Some(&chunk.response),
            _ => None,
        }
    }

    fn server_error(&self) -> Option<&str> {
        match self {
            GenerateStreamEvent::Error(err) => Some(err),
            _ => None,
        }
    }
}
