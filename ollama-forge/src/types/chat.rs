//! Contains all data structures that are particularly used for Ollama Chat API

use ollama_forge_macros::FromBytes;
use serde::{Deserialize, Serialize};

use crate::parser::StreamEventExt;
use crate::stream::{ResponseStream, TextChunk};
use crate::types::{ModelOptions, Role, Thinking, ThinkingLevel};

/// Body of `POST /api/chat`.
///
/// Usually built through [`SimpleChatRequest`] or [`StreamingChatRequest`].
#[derive(Serialize, Default, Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatRequestMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub think: Option<Thinking>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ModelOptions>,
}

/// Represents a single message in a chat request.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ChatRequestMessage {
    Message(RegularChatRequestMessage),
    ToolCallResult(ToolCallResultMessage),
}

impl ChatRequestMessage {
    pub fn system(content: impl Into<String>) -> Self {
        RegularChatRequestMessage::new(Role::System, content).into()
    }

    pub fn user(content: impl Into<String>) -> Self {
        RegularChatRequestMessage::new(Role::User, content).into()
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        RegularChatRequestMessage::new(Role::Assistant, content).into()
    }

    pub fn content(&self) -> &str {
        match self {
            ChatRequestMessage::Message(message) => &message.content,
            ChatRequestMessage::ToolCallResult(result) => &result.content,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RegularChatRequestMessage {
    pub role: Role,
    pub content: String,
    /// Base64-encoded images attached to this message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Tool calls previously made by the assistant, replayed as history.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl RegularChatRequestMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            images: Vec::new(),
            tool_calls: Vec::new(),
        }
    }

    pub fn add_image(mut self, image: impl Into<String>) -> Self {
        self.images.push(image.into());
        self
    }

    pub fn add_tool_call(mut self, call: ToolCall) -> Self {
        self.tool_calls.push(call);
        self
    }
}

impl From<RegularChatRequestMessage> for ChatRequestMessage {
    fn from(message: RegularChatRequestMessage) -> Self {
        ChatRequestMessage::Message(message)
    }
}

/// The output of a tool, sent back to the model.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ToolCallResultMessage {
    pub role: Role,
    /// Name of the tool that produced the result.
    pub tool_name: String,
    pub content: String,
}

impl ToolCallResultMessage {
    pub fn new(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            tool_name: tool_name.into(),
            content: content.into(),
        }
    }
}

impl From<ToolCallResultMessage> for ChatRequestMessage {
    fn from(message: ToolCallResultMessage) -> Self {
        ChatRequestMessage::ToolCallResult(message)
    }
}

/// A tool the model may call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolSpec {
    Function { function: FunctionalTool },
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FunctionalTool {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the tool's parameters.
    pub parameters: serde_json::Value,
}

/// Represents a chat response from the Ollama API.
///
/// A whole answer for non-streaming requests, one chunk per line otherwise.
#[derive(Deserialize, Serialize, Default, FromBytes, Debug, Clone, PartialEq)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub message: ChatResponseMessage,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub done_reason: Option<String>,
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub eval_count: u64,
}

#[derive(Deserialize, Serialize, Default, Debug, Clone, PartialEq)]
pub struct ChatResponseMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub thinking: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub function: FunctionInvocation,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FunctionInvocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub name: String,
    pub arguments: serde_json::Value,
}

macro_rules! chat_request_variant {
    ($(#[$meta:meta])* $name:ident, stream = $stream:expr) => {
        $(#[$meta])*
        #[derive(Default, Debug, Clone)]
        pub struct $name {
            pub model: String,
            pub messages: Vec<ChatRequestMessage>,
            pub tools: Option<Vec<ToolSpec>>,
            pub think: Option<Thinking>,
            pub format: Option<serde_json::Value>,
            pub keep_alive: Option<String>,
            pub options: Option<ModelOptions>,
        }

        impl $name {
            pub fn new(model: impl Into<String>) -> Self {
                Self {
                    model: model.into(),
                    ..Default::default()
                }
            }

            pub fn add_message(mut self, message: impl Into<ChatRequestMessage>) -> Self {
                self.messages.push(message.into());
                self
            }

            pub fn messages(mut self, messages: Vec<ChatRequestMessage>) -> Self {
                self.messages = messages;
                self
            }

            pub fn tools(mut self, tools: Vec<ToolSpec>) -> Self {
                self.tools = Some(tools);
                self
            }

            pub fn format(mut self, format: serde_json::Value) -> Self {
                self.format = Some(format);
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

        impl From<$name> for ChatRequest {
            fn from(value: $name) -> Self {
                ChatRequest {
                    model: value.model,
                    messages: value.messages,
                    stream: $stream,
                    tools: value.tools,
                    think: value.think,
                    format: value.format,
                    keep_alive: value.keep_alive,
                    options: value.options,
                }
            }
        }
    };
}

chat_request_variant!(
    /// A chat request answered with a single [`ChatResponse`].
    SimpleChatRequest,
    stream = false
);

chat_request_variant!(
    /// A chat request answered with a [`ChatStream`].
    StreamingChatRequest,
    stream = true
);

/// Represents an event received from a streaming chat response.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ChatStreamEvent {
    Message(ChatResponse),
    /// The server reported an error in-band.
    Error(String),
    /// A line that could not be decoded.
    Partial {
        partial: String,
        error: Option<String>,
    },
}

pub type ChatStream = ResponseStream<ChatStreamEvent>;

impl StreamEventExt<ChatResponse> for ChatStreamEvent {
    fn from_message(msg: ChatResponse) -> Self {
        ChatStreamEvent::Message(msg)
    }

    fn from_error(err: String) -> Self {
        ChatStreamEvent::Error(err)
    }

    fn partial(partial: String, error: Option<String>) -> Self {
        ChatStreamEvent::Partial { partial, error }
    }
}

impl TextChunk for ChatStreamEvent {
    fn text(&self) -> Option<&str> {
        match self {
            ChatStreamEvent::Message(response) => Some(&response.message.content),
            _ => None,
        }
    }

    fn server_error(&self) -> Option<&str> {
        match self {
            ChatStreamEvent::Error(err) => Some(err),
            _ => None,
        }
    }
}
