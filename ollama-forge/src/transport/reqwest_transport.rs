use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Url};

use crate::transport::{ByteStream, Transport};
use crate::types::{HttpMethod, HttpRequest, HttpResponse};
use crate::{Error, Result};

/// A [`Transport`] implementation that uses the `reqwest` crate for making HTTP requests.
///
/// This is the default transport used by [`OllamaClient`](crate::OllamaClient).
/// Non-streaming requests are bounded by the configured timeout as a whole.
/// Streaming requests can run for minutes, so for them the timeout only bounds
/// connecting and each wait for the next chunk. A server that stalls
/// mid-stream ends the stream with [`Error::Timeout`].
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a new `ReqwestTransport`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Client`] if the `reqwest` client cannot be built.
    pub fn new(base_url: Url, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            api_key,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send(&self, request: HttpRequest, bounded: bool) -> Result<reqwest::Response> {
        let url = self
            .base_url
            .join(&request.path)
            .map_err(|e| Error::Client(format!("Invalid request path {}: {}", request.path, e)))?;

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Delete => self.client.delete(url),
        };

        if let Some(timeout) = request.timeout.or(bounded.then_some(self.timeout)) {
            builder = builder.timeout(timeout);
        }
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(Error::from_reqwest)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let err = Error::from_status(status.as_u16(), &body);
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %request.path, status = status.as_u16(), error = %err, "request rejected");
        Err(err)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[cfg_attr(feature = "tracing", instrument(skip(self, request), fields(path = %request.path)))]
    async fn send_http_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.send(request, true).await?;
        let body = response.bytes().await.map_err(Error::from_reqwest)?;
        Ok(HttpResponse { body: Some(body) })
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request), fields(path = %request.path)))]
    async fn send_http_stream_request(&self, request: HttpRequest) -> Result<ByteStream> {
        let response = self.send(request, false).await?;
        let stream = response
            .bytes_stream()
            .map(|item| item.map_err(Error::from_reqwest))
            .boxed();
        Ok(stream)
    }
}
