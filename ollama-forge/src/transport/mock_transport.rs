use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[cfg(feature = "tracing")]
use tracing::instrument;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream;
use futures::StreamExt;

use crate::transport::{ByteStream, Transport};
use crate::types::{HttpRequest, HttpResponse};
use crate::{Error, Result};

/// One scripted answer of a [`MockTransport`].
#[derive(Debug)]
pub enum MockReply {
    /// A complete body; streamed as a single chunk.
    Body(Bytes),
    /// A successful response without a body.
    Empty,
    /// A body delivered in the given chunks; joined for non-streaming requests.
    Chunks(Vec<Bytes>),
    /// The request fails with this error.
    Fail(Error),
}

/// A [`Transport`] that answers from a queue of scripted replies.
///
/// Replies are consumed in order, one per request, regardless of the path.
/// Every request is recorded so tests can assert on what the client sent,
/// including each retry and fallback attempt.
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        lock(&self.replies).push_back(reply);
        self
    }

    /// Queues a JSON body.
    pub fn with_json(self, value: serde_json::Value) -> Self {
        self.with_reply(MockReply::Body(Bytes::from(value.to_string())))
    }

    pub fn with_empty(self) -> Self {
        self.with_reply(MockReply::Empty)
    }

    /// Queues a streaming body with one chunk per line, each newline-terminated.
    pub fn with_lines<I, L>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        let chunks = lines
            .into_iter()
            .map(|line| Bytes::from(format!("{}\n", line.into())))
            .collect();
        self.with_reply(MockReply::Chunks(chunks))
    }

    /// Queues a streaming body split exactly at the given chunk boundaries.
    pub fn with_chunks<I, C>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        self.with_reply(MockReply::Chunks(chunks.into_iter().map(Into::into).collect()))
    }

    /// Queues a non-success HTTP status, mapped like a real server response.
    pub fn with_status(self, status: u16, body: &str) -> Self {
        self.with_reply(MockReply::Fail(Error::from_status(status, body.as_bytes())))
    }

    pub fn with_error(self, error: Error) -> Self {
        self.with_reply(MockReply::Fail(error))
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Replies not yet consumed.
    pub fn pending_replies(&self) -> usize {
        lock(&self.replies).len()
    }

    fn next_reply(&self, request: HttpRequest) -> Result<MockReply> {
        let path = request.path.clone();
        lock(&self.requests).push(request);
        lock(&self.replies).pop_front().ok_or_else(|| {
            Error::Client(format!("MockTransport: no reply queued for {}", path))
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Transport for MockTransport {
    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    async fn send_http_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        match self.next_reply(request)? {
            MockReply::Body(body) => Ok(HttpResponse::new(body)),
            MockReply::Empty => Ok(HttpResponse::empty()),
            MockReply::Chunks(chunks) => {
                let mut body = BytesMut::new();
                for chunk in chunks {
                    body.extend_from_slice(&chunk);
                }
                Ok(HttpResponse::new(body.freeze()))
            }
            MockReply::Fail(err) => Err(err),
        }
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    async fn send_http_stream_request(&self, request: HttpRequest) -> Result<ByteStream> {
        match self.next_reply(request)? {
            MockReply::Body(body) => Ok(stream::once(async move { Ok(body) }).boxed()),
            MockReply::Empty => Ok(stream::empty().boxed()),
            MockReply::Chunks(chunks) => Ok(stream::iter(chunks.into_iter().map(Ok)).boxed()),
            MockReply::Fail(err) => Err(err),
        }
    }
}
