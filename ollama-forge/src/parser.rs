//! Turns a newline-delimited JSON byte stream into typed events.
//!
//! The Ollama server streams one JSON object per line. Chunks from the
//! transport can split a line anywhere, so bytes are buffered until a full
//! line is available.

use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;

/// Lets endpoint-specific event enums be built from a decoded message `M`,
/// an in-band server error, or a line that could not be decoded.
pub trait StreamEventExt<M>: Sized {
    fn from_message(msg: M) -> Self;

    fn from_error(err: String) -> Self;

    fn partial(partial: String, error: Option<String>) -> Self;
}

/// Newline-delimited JSON parser over a byte stream.
///
/// Every non-blank line yields exactly one event:
/// - an object with a string `error` field becomes `E::from_error`,
/// - a line that decodes as `M` becomes `E::from_message`,
/// - anything else becomes `E::partial` with the decode error.
///
/// A final line without a trailing newline is decoded the same way. A
/// transport error is passed through once and ends the stream.
pub struct NdjsonParser<S, M, E> {
    inner: S,
    buffer: BytesMut,
    finished: bool,
    _marker: PhantomData<fn() -> (M, E)>,
}

impl<S, M, E> NdjsonParser<S, M, E>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
    M: DeserializeOwned,
    E: StreamEventExt<M>,
{
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: BytesMut::new(),
            finished: false,
            _marker: PhantomData,
        }
    }

    fn next_line(&mut self) -> Option<Bytes> {
        loop {
            let newline = self.buffer.iter().position(|&b| b == b'\n')?;
            let line = self.buffer.split_to(newline + 1).freeze();
            if !is_blank(&line) {
                return Some(line);
            }
        }
    }

    fn decode(line: &[u8]) -> E {
        let text = String::from_utf8_lossy(line);
        let text = text.trim();

        let value = match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(e) => return Self::undecodable(text, e),
        };

        if let Some(err) = value.get("error").and_then(Value::as_str) {
            return E::from_error(err.to_string());
        }

        match serde_json::from_value::<M>(value) {
            Ok(msg) => E::from_message(msg),
            Err(e) => Self::undecodable(text, e),
        }
    }

    fn undecodable(text: &str, err: serde_json::Error) -> E {
        #[cfg(feature = "tracing")]
        tracing::debug!(line = text, error = %err, "undecodable stream line");
        E::partial(text.to_string(), Some(err.to_string()))
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

impl<S, M, E> Stream for NdjsonParser<S, M, E>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
    M: DeserializeOwned,
    E: StreamEventExt<M>,
{
    type Item = Result<E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(line) = this.next_line() {
                return Poll::Ready(Some(Ok(Self::decode(&line))));
            }
            if this.finished {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    this.buffer.clear();
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    let rest = this.buffer.split().freeze();
                    if !is_blank(&rest) {
                        return Poll::Ready(Some(Ok(Self::decode(&rest))));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
