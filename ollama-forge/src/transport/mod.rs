//! The seam between the client and the network.
//!
//! [`OllamaClient`](crate::OllamaClient) only talks to a [`Transport`]; swap
//! in [`MockTransport`] to exercise client logic without a server.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::types::{HttpRequest, HttpResponse};
use crate::Result;

mod mock_transport;
mod reqwest_transport;

pub use mock_transport::{MockReply, MockTransport};
pub use reqwest_transport::ReqwestTransport;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends a request and reads the whole response body.
    ///
    /// Implementations must map non-success statuses to the typed errors of
    /// [`Error::from_status`](crate::Error::from_status).
    async fn send_http_request(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Sends a request and returns the response body as it arrives.
    async fn send_http_stream_request(&self, request: HttpRequest) -> Result<ByteStream>;
}
