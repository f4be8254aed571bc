use std::future::Future;

use bytes::Bytes;

#[cfg(feature = "metrics")]
use metrics::counter;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::builder::OllamaClientBuilder;
use crate::config::PING_TIMEOUT;
use crate::fallback::FallbackPolicy;
use crate::retry::RetryPolicy;
use crate::transport::ByteStream;
use crate::types::chat::{ChatRequest, ChatResponse, ChatStream, SimpleChatRequest, StreamingChatRequest};
use crate::types::embed::{EmbedRequest, EmbedResponse, EmbeddingsRequest, EmbeddingsResponse};
use crate::types::generate::{
    GenerateRequest, GenerateResponse, GenerateStream, SimpleGenerateRequest,
    StreamingGenerateRequest,
};
use crate::types::{
    CopyModelRequest, CreateModelRequest, DeleteModelRequest, HttpRequest, ListModelsResponse,
    ListRunningModelsResponse, ProgressResponse, ProgressStream, PullModelRequest,
    PushModelRequest, ServerStatus, ShowModelRequest, ShowModelResponse, VersionResponse,
};
use crate::OllamaClient;
use crate::{Error, Result};

impl OllamaClient {
    pub fn builder() -> OllamaClientBuilder {
        OllamaClientBuilder::new()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn fallback_policy(&self) -> &FallbackPolicy {
        &self.fallback
    }

    /// Runs `op` with `model`, then with each of its backups, until one succeeds.
    ///
    /// A failure moves on to the next candidate only when it is
    /// [fallback-eligible](Error::is_fallback_eligible); other errors are
    /// returned immediately. If every candidate fails, the last error is
    /// returned.
    #[cfg_attr(feature = "tracing", instrument(skip(self, op)))]
    pub async fn with_fallback<T, F, Fut>(&self, model: &str, mut op: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for (attempt, candidate) in self.fallback.chain_for(model).into_iter().enumerate() {
            if attempt > 0 {
                #[cfg(feature = "tracing")]
                tracing::warn!(primary = model, fallback = %candidate, "falling back to backup model");
                #[cfg(feature = "metrics")]
                counter!("ollama_forge.fallbacks_total").increment(1);
            }

            match op(candidate).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_fallback_eligible() => last_error = Some(err),
                Err(err) => return Err(err),
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::Client(format!("No candidate models for {}", model))))
    }

    async fn send(&self, operation: &'static str, request: HttpRequest) -> Result<Bytes> {
        let response = self
            .retry
            .run(operation, || self.transport.send_http_request(request.clone()))
            .await?;

        response
            .body
            .ok_or_else(|| Error::Protocol("Missing response body".into()))
    }

    async fn send_ignoring_body(&self, operation: &'static str, request: HttpRequest) -> Result<()> {
        self.retry
            .run(operation, || self.transport.send_http_request(request.clone()))
            .await
            .map(|_| ())
    }

    async fn open_stream(&self, operation: &'static str, request: HttpRequest) -> Result<ByteStream> {
        self.retry
            .run(operation, || {
                self.transport.send_http_stream_request(request.clone())
            })
            .await
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn version(&self) -> Result<VersionResponse> {
        let bytes = self.send("version", HttpRequest::new("/api/version")).await?;
        VersionResponse::from_bytes(bytes)
    }

    /// Health check: one `GET /api/version`, bounded by
    /// [`PING_TIMEOUT`](crate::config::PING_TIMEOUT) and never retried.
    /// Failures are reported in the returned status, not as an error.
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn ping(&self) -> ServerStatus {
        let http = HttpRequest::new("/api/version").timeout(PING_TIMEOUT);
        let version = self
            .transport
            .send_http_request(http)
            .await
            .and_then(|response| {
                response
                    .body
                    .ok_or_else(|| Error::Protocol("Missing response body".into()))
            })
            .and_then(VersionResponse::from_bytes);

        match version {
            Ok(version) => ServerStatus::Running {
                version: version.version,
            },
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %err, "server not reachable");
                ServerStatus::NotRunning {
                    reason: err.to_string(),
                }
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        self.ping().await.is_running()
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn generate_simple(
        &self,
        request: SimpleGenerateRequest,
    ) -> Result<GenerateResponse> {
        #[cfg(feature = "metrics")]
        counter!("ollama_forge.requests_total", "endpoint" => "generate", "type" => "non_streaming").increment(1);

        let request = GenerateRequest::from(request);
        let model = request.model.clone();

        self.with_fallback(&model, move |model| {
            let request = GenerateRequest {
                model,
                ..request.clone()
            };
            async move {
                let http = HttpRequest::new("/api/generate").post().body(&request)?;
                let bytes = self.send("generate", http).await?;
                GenerateResponse::from_bytes(bytes)
            }
        })
        .await
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn generate_stream(
        &self,
        request: StreamingGenerateRequest,
    ) -> Result<GenerateStream> {
        #[cfg(feature = "metrics")]
        counter!("ollama_forge.requests_total", "endpoint" => "generate", "type" => "streaming").increment(1);

        let request = GenerateRequest::from(request);
        let model = request.model.clone();

        let bytes = self
            .with_fallback(&model, move |model| {
                let request = GenerateRequest {
                    model,
                    ..request.clone()
                };
                async move {
                    let http = HttpRequest::new("/api/generate").post().body(&request)?;
                    self.open_stream("generate", http).await
                }
            })
            .await?;

        Ok(GenerateStream::from_bytes_stream::<_, GenerateResponse>(bytes))
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn chat_simple(&self, request: SimpleChatRequest) -> Result<ChatResponse> {
        #[cfg(feature = "metrics")]
        counter!("ollama_forge.requests_total", "endpoint" => "chat", "type" => "non_streaming").increment(1);

        let request = ChatRequest::from(request);
        let model = request.model.clone();

        self.with_fallback(&model, move |model| {
            let request = ChatRequest {
                model,
                ..request.clone()
            };
            async move {
                let http = HttpRequest::new("/api/chat").post().body(&request)?;
                let bytes = self.send("chat", http).await?;
                ChatResponse::from_bytes(bytes)
            }
        })
        .await
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn chat_stream(&self, request: StreamingChatRequest) -> Result<ChatStream> {
        #[cfg(feature = "metrics")]
        counter!("ollama_forge.requests_total", "endpoint" => "chat", "type" => "streaming").increment(1);

        let request = ChatRequest::from(request);
        let model = request.model.clone();

        let bytes = self
            .with_fallback(&model, move |model| {
                let request = ChatRequest {
                    model,
                    ..request.clone()
                };
                async move {
                    let http = HttpRequest::new("/api/chat").post().body(&request)?;
                    self.open_stream("chat", http).await
                }
            })
            .await?;

        Ok(ChatStream::from_bytes_stream::<_, ChatResponse>(bytes))
    }

    /// Embeds one or more inputs through `/api/embed`.
    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse> {
        #[cfg(feature = "metrics")]
        counter!("ollama_forge.requests_total", "endpoint" => "embed", "type" => "non_streaming").increment(1);

        if request.input.is_empty() {
            return Err(Error::InvalidInput("Nothing to embed".into()));
        }
        let model = request.model.clone();

        self.with_fallback(&model, move |model| {
            let request = EmbedRequest {
                model,
                ..request.clone()
            };
            async move {
                let http = HttpRequest::new("/api/embed").post().body(&request)?;
                let bytes = self.send("embed", http).await?;
                EmbedResponse::from_bytes(bytes)
            }
        })
        .await
    }

    /// Embeds a single prompt through the legacy `/api/embeddings` endpoint.
    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn embeddings(&self, request: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        #[cfg(feature = "metrics")]
        counter!("ollama_forge.requests_total", "endpoint" => "embeddings", "type" => "non_streaming").increment(1);

        let model = request.model.clone();

        self.with_fallback(&model, move |model| {
            let request = EmbeddingsRequest {
                model,
                ..request.clone()
            };
            async move {
                let http = HttpRequest::new("/api/embeddings").post().body(&request)?;
                let bytes = self.send("embeddings", http).await?;
                EmbeddingsResponse::from_bytes(bytes)
            }
        })
        .await
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn list_models(&self) -> Result<ListModelsResponse> {
        let bytes = self.send("list_models", HttpRequest::new("/api/tags")).await?;
        ListModelsResponse::from_bytes(bytes)
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn list_running_models(&self) -> Result<ListRunningModelsResponse> {
        let bytes = self.send("list_running_models", HttpRequest::new("/api/ps")).await?;
        ListRunningModelsResponse::from_bytes(bytes)
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn show_model(&self, request: ShowModelRequest) -> Result<ShowModelResponse> {
        let http = HttpRequest::new("/api/show").post().body(&request)?;
        let bytes = self.send("show_model", http).await?;
        ShowModelResponse::from_bytes(bytes)
    }

    /// Downloads a model and waits for the final status.
    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn pull_model(&self, request: PullModelRequest) -> Result<ProgressResponse> {
        let request = PullModelRequest {
            stream: false,
            ..request
        };
        let http = HttpRequest::new("/api/pull").post().body(&request)?;
        let bytes = self.send("pull_model", http).await?;
        ProgressResponse::from_bytes(bytes)
    }

    /// Downloads a model, reporting progress per layer.
    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn pull_model_stream(&self, request: PullModelRequest) -> Result<ProgressStream> {
        let request = PullModelRequest {
            stream: true,
            ..request
        };
        let http = HttpRequest::new("/api/pull").post().body(&request)?;
        let bytes = self.open_stream("pull_model", http).await?;
        Ok(ProgressStream::from_bytes_stream::<_, ProgressResponse>(bytes))
    }

    /// Pulls `model` unless it is already installed. Returns whether a pull happened.
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn ensure_model(&self, model: &str) -> Result<bool> {
        if self.list_models().await?.contains(model) {
            return Ok(false);
        }

        let status = self.pull_model(PullModelRequest::new(model)).await?;
        if status.is_success() {
            Ok(true)
        } else {
            Err(Error::Protocol(format!(
                "Pull of {} ended with status {}",
                model, status.status
            )))
        }
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn push_model(&self, request: PushModelRequest) -> Result<ProgressResponse> {
        let request = PushModelRequest {
            stream: false,
            ..request
        };
        let http = HttpRequest::new("/api/push").post().body(&request)?;
        let bytes = self.send("push_model", http).await?;
        ProgressResponse::from_bytes(bytes)
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn push_model_stream(&self, request: PushModelRequest) -> Result<ProgressStream> {
        let request = PushModelRequest {
            stream: true,
            ..request
        };
        let http = HttpRequest::new("/api/push").post().body(&request)?;
        let bytes = self.open_stream("push_model", http).await?;
        Ok(ProgressStream::from_bytes_stream::<_, ProgressResponse>(bytes))
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn create_model(&self, request: CreateModelRequest) -> Result<ProgressResponse> {
        let request = CreateModelRequest {
            stream: false,
            ..request
        };
        let http = HttpRequest::new("/api/create").post().body(&request)?;
        let bytes = self.send("create_model", http).await?;
        ProgressResponse::from_bytes(bytes)
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    pub async fn create_model_stream(&self, request: CreateModelRequest) -> Result<ProgressStream> {
        let request = CreateModelRequest {
            stream: true,
            ..request
        };
        let http = HttpRequest::new("/api/create").post().body(&request)?;
        let bytes = self.open_stream("create_model", http).await?;
        Ok(ProgressStream::from_bytes_stream::<_, ProgressResponse>(bytes))
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn copy_model(&self, source: &str, destination: &str) -> Result<()> {
        let request = CopyModelRequest {
            source: source.to_string(),
            destination: destination.to_string(),
        };
        let http = HttpRequest::new("/api/copy").post().body(&request)?;
        self.send_ignoring_body("copy_model", http).await
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn delete_model(&self, model: &str) -> Result<()> {
        let request = DeleteModelRequest {
            model: model.to_string(),
        };
        let http = HttpRequest::new("/api/delete").delete().body(&request)?;
        self.send_ignoring_body("delete_model", http).await
    }
}
