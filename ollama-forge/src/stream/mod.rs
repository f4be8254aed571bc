//! Provides the stream type returned by every streaming endpoint.
//!
//! [`ResponseStream`] wraps the parsed event stream and adds cancellation
//! and text accumulation on top of it.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::parser::{NdjsonParser, StreamEventExt};
use crate::{Error, Result};

mod cancel;

use cancel::Cancellable;

/// A stream of events from one streaming response.
pub struct ResponseStream<E> {
    inner: Pin<Box<dyn Stream<Item = Result<E>> + Send>>,
}

impl<E: Send + 'static> ResponseStream<E> {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<E>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Parses a raw NDJSON byte stream whose lines decode as `M`.
    pub fn from_bytes_stream<S, M>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + Unpin + 'static,
        M: DeserializeOwned + 'static,
        E: StreamEventExt<M>,
    {
        Self::new(NdjsonParser::<S, M, E>::new(stream))
    }

    /// Ends the stream when `token` is cancelled.
    ///
    /// The first poll after cancellation yields [`Error::Cancelled`]; the
    /// stream is finished afterwards and the underlying response is dropped.
    pub fn cancel_on(self, token: CancellationToken) -> Self {
        Self::new(Cancellable::new(self.inner, token))
    }
}

impl<E> Stream for ResponseStream<E> {
    type Item = Result<E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Events that carry a piece of generated text.
pub trait TextChunk {
    /// The text this event contributes, if it is a decoded message.
    fn text(&self) -> Option<&str>;

    /// The message of an in-band server error.
    fn server_error(&self) -> Option<&str>;
}

impl<E: TextChunk> ResponseStream<E> {
    /// Drains the stream and concatenates every text chunk.
    ///
    /// An in-band error line becomes [`Error::Stream`]. Undecodable lines are
    /// skipped.
    pub async fn collect_text(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(event) = self.next().await {
            let event = event?;
            if let Some(err) = event.server_error() {
                return Err(Error::Stream(err.to_string()));
            }
            match event.text() {
                Some(chunk) => text.push_str(chunk),
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("skipping undecodable chunk while collecting text");
                }
            }
        }
        Ok(text)
    }
}
