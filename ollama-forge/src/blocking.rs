//! A synchronous facade over [`OllamaClient`].
//!
//! Every call runs the async client to completion on a private
//! single-threaded tokio runtime. Do not use it from inside an async
//! context; `block_on` panics there.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use tokio::runtime::{Builder, Runtime};

use crate::stream::{ResponseStream, TextChunk};
use crate::types::chat::{ChatResponse, ChatStreamEvent, SimpleChatRequest, StreamingChatRequest};
use crate::types::embed::{EmbedRequest, EmbedResponse, EmbeddingsRequest, EmbeddingsResponse};
use crate::types::generate::{
    GenerateResponse, GenerateStreamEvent, SimpleGenerateRequest, StreamingGenerateRequest,
};
use crate::types::{
    CreateModelRequest, ListModelsResponse, ListRunningModelsResponse, ProgressResponse,
    ProgressStreamEvent, PullModelRequest, PushModelRequest, ServerStatus, ShowModelRequest,
    ShowModelResponse, VersionResponse,
};
use crate::{Error, OllamaClient, Result};

/// Blocking counterpart of [`OllamaClient`]. Build one with
/// [`OllamaClientBuilder::build_blocking`](crate::builder::OllamaClientBuilder::build_blocking).
#[derive(Clone)]
pub struct BlockingOllamaClient {
    client: OllamaClient,
    runtime: Arc<Runtime>,
}

/// Iterator over the events of a streaming response.
pub struct BlockingStream<E> {
    stream: ResponseStream<E>,
    runtime: Arc<Runtime>,
}

impl<E> Iterator for BlockingStream<E> {
    type Item = Result<E>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.stream.next())
    }
}

impl<E: TextChunk + Send + 'static> BlockingStream<E> {
    /// See [`ResponseStream::collect_text`].
    pub fn collect_text(self) -> Result<String> {
        self.runtime.block_on(self.stream.collect_text())
    }
}

impl BlockingOllamaClient {
    pub(crate) fn new(client: OllamaClient) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Client(format!("Failed to start runtime: {}", e)))?;

        Ok(Self {
            client,
            runtime: Arc::new(runtime),
        })
    }

    /// The async client this facade drives.
    pub fn async_client(&self) -> &OllamaClient {
        &self.client
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn stream<E>(&self, stream: ResponseStream<E>) -> BlockingStream<E> {
        BlockingStream {
            stream,
            runtime: Arc::clone(&self.runtime),
        }
    }

    pub fn ping(&self) -> ServerStatus {
        self.block_on(self.client.ping())
    }

    pub fn is_running(&self) -> bool {
        self.block_on(self.client.is_running())
    }

    pub fn version(&self) -> Result<VersionResponse> {
        self.block_on(self.client.version())
    }

    pub fn generate_simple(&self, request: SimpleGenerateRequest) -> Result<GenerateResponse> {
        self.block_on(self.client.generate_simple(request))
    }

    pub fn generate_stream(
        &self,
        request: StreamingGenerateRequest,
    ) -> Result<BlockingStream<GenerateStreamEvent>> {
        let stream = self.block_on(self.client.generate_stream(request))?;
        Ok(self.stream(stream))
    }

    pub fn chat_simple(&self, request: SimpleChatRequest) -> Result<ChatResponse> {
        self.block_on(self.client.chat_simple(request))
    }

    pub fn chat_stream(
        &self,
        request: StreamingChatRequest,
    ) -> Result<BlockingStream<ChatStreamEvent>> {
        let stream = self.block_on(self.client.chat_stream(request))?;
        Ok(self.stream(stream))
    }

    pub fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse> {
        self.block_on(self.client.embed(request))
    }

    pub fn embeddings(&self, request: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        self.block_on(self.client.embeddings(request))
    }

    pub fn list_models(&self) -> Result<ListModelsResponse> {
        self.block_on(self.client.list_models())
    }

    pub fn list_running_models(&self) -> Result<ListRunningModelsResponse> {
        self.block_on(self.client.list_running_models())
    }

    pub fn show_model(&self, request: ShowModelRequest) -> Result<ShowModelResponse> {
        self.block_on(self.client.show_model(request))
    }

    pub fn pull_model(&self, request: PullModelRequest) -> Result<ProgressResponse> {
        self.block_on(self.client.pull_model(request))
    }

    pub fn pull_model_stream(
        &self,
        request: PullModelRequest,
    ) -> Result<BlockingStream<ProgressStreamEvent>> {
        let stream = self.block_on(self.client.pull_model_stream(request))?;
        Ok(self.stream(stream))
    }

    pub fn ensure_model(&self, model: &str) -> Result<bool> {
        self.block_on(self.client.ensure_model(model))
    }

    pub fn push_model(&self, request: PushModelRequest) -> Result<ProgressResponse> {
        self.block_on(self.client.push_model(request))
    }

    pub fn create_model(&self, request: CreateModelRequest) -> Result<ProgressResponse> {
        self.block_on(self.client.create_model(request))
    }

    pub fn copy_model(&self, source: &str, destination: &str) -> Result<()> {
        self.block_on(self.client.copy_model(source, destination))
    }

    pub fn delete_model(&self, model: &str) -> Result<()> {
        self.block_on(self.client.delete_model(model))
    }
}
