use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;

use crate::Result;

/// A transport-agnostic description of one call to the Ollama API.
///
/// Requests are cloned for every retry and fallback attempt, so the body is
/// stored as an already-serialised [`serde_json::Value`].
#[derive(Default, Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Path relative to the server root, e.g. `/api/chat`.
    pub path: String,
    pub method: HttpMethod,
    pub body: Option<serde_json::Value>,
    /// Overrides the transport's timeout for this request only.
    pub timeout: Option<Duration>,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub body: Option<Bytes>,
}

impl HttpResponse {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: Some(body.into()),
        }
    }

    pub fn empty() -> Self {
        Self { body: None }
    }
}

impl HttpRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn get(mut self) -> Self {
        self.method = HttpMethod::Get;
        self
    }

    pub fn post(mut self) -> Self {
        self.method = HttpMethod::Post;
        self
    }

    pub fn delete(mut self) -> Self {
        self.method = HttpMethod::Delete;
        self
    }

    pub fn body<T: Serialize>(mut self, body: T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The `model` field of the JSON body, if any.
    pub fn model(&self) -> Option<&str> {
        self.body.as_ref()?.get("model")?.as_str()
    }
}
