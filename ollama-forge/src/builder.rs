use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use reqwest::Url;

use crate::blocking::BlockingOllamaClient;
use crate::config::{self, EnvOverrides};
use crate::fallback::FallbackPolicy;
use crate::retry::RetryPolicy;
use crate::transport::{ReqwestTransport, Transport};
use crate::{Error, OllamaClient, Result};

/// A builder for constructing an [`OllamaClient`].
///
/// Anything not set explicitly comes from the environment or [`config`]:
///
/// - base URL: `OLLAMA_HOST`, else `http://127.0.0.1:11434`. The scheme may be omitted.
/// - API key: `OLLAMA_API_KEY`, else none.
/// - timeout: `OLLAMA_FORGE_TIMEOUT_SECS`, else [`config::default_timeout`].
/// - retries: `OLLAMA_FORGE_MAX_RETRIES` overrides the retry policy's count.
/// - fallback: [`FallbackPolicy::default`].
/// - transport: [`ReqwestTransport`].
pub struct OllamaClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
    fallback: FallbackPolicy,
    transport: Option<Arc<dyn Transport + Send + Sync>>,
}

#[derive(Debug, PartialEq)]
struct Settings {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl OllamaClientBuilder {
    /// Creates a new [`OllamaClientBuilder`]. This method is called by [`OllamaClient::builder`]
    pub(crate) fn new() -> Self {
        OllamaClientBuilder {
            base_url: None,
            api_key: None,
            timeout: None,
            retry: None,
            fallback: FallbackPolicy::default(),
            transport: None,
        }
    }

    /// Sets the base URL for the Ollama API.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the API key sent as a bearer token.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Bounds every non-streaming request, and connection setup for streaming ones.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replaces the retry policy. An explicit policy wins over `OLLAMA_FORGE_MAX_RETRIES`.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Sends every request once.
    pub fn no_retries(self) -> Self {
        self.retry_policy(RetryPolicy::none())
    }

    pub fn fallback_policy(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Registers an extra backup for `primary` on top of the current policy.
    pub fn fallback_model(mut self, primary: impl Into<String>, backup: impl Into<String>) -> Self {
        self.fallback.add_backup(primary, backup);
        self
    }

    pub fn disable_fallback(self) -> Self {
        self.fallback_policy(FallbackPolicy::disabled())
    }

    /// Sets a custom transport implementation for the client.
    ///
    /// When set, the base URL, API key and timeout are ignored. For testing,
    /// use [`MockTransport`](crate::transport::MockTransport).
    pub fn transport(mut self, transport: Arc<dyn Transport + Send + Sync>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the [`OllamaClient`] with the configured options.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Client`] if the base URL is invalid or if there's
    /// an issue initializing [`ReqwestTransport`].
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub fn build(self) -> Result<OllamaClient> {
        let settings = self.settings(EnvOverrides::from_env());

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let base_url = Url::parse(&settings.base_url)
                    .map_err(|e| Error::Client(format!("Invalid base URL: {}", e)))?;

                #[cfg(feature = "tracing")]
                tracing::debug!(%base_url, timeout_secs = settings.timeout.as_secs(), "using reqwest transport");

                Arc::new(ReqwestTransport::new(base_url, settings.api_key, settings.timeout)?)
            }
        };

        Ok(OllamaClient {
            transport,
            retry: settings.retry,
            fallback: self.fallback,
        })
    }

    /// Merges explicit settings over `env`, then over the defaults.
    fn settings(&self, env: EnvOverrides) -> Settings {
        let retry = self.retry.unwrap_or_else(|| {
            let policy = RetryPolicy::default();
            match env.max_retries {
                Some(max_retries) => policy.max_retries(max_retries),
                None => policy,
            }
        });

        Settings {
            base_url: self
                .base_url
                .as_deref()
                .map(config::normalize_host)
                .or(env.host)
                .unwrap_or_else(|| config::DEFAULT_HOST.to_string()),
            api_key: self.api_key.clone().or(env.api_key),
            timeout: self
                .timeout
                .or(env.timeout)
                .unwrap_or_else(config::default_timeout),
            retry,
        }
    }

    /// Builds a [`BlockingOllamaClient`] that drives the async client on its
    /// own single-threaded runtime.
    ///
    /// Must not be called from within an async runtime.
    pub fn build_blocking(self) -> Result<BlockingOllamaClient> {
        BlockingOllamaClient::new(self.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with_retries(max_retries: u32) -> EnvOverrides {
        EnvOverrides {
            max_retries: Some(max_retries),
            ..EnvOverrides::default()
        }
    }

    #[test]
    fn explicit_retry_policy_beats_environment() {
        let builder = OllamaClientBuilder::new().retry_policy(RetryPolicy::default().max_retries(1));
        assert_eq!(builder.settings(env_with_retries(9)).retry.max_retries, 1);

        let builder = OllamaClientBuilder::new().no_retries();
        assert_eq!(builder.settings(env_with_retries(9)).retry, RetryPolicy::none());
    }

    #[test]
    fn environment_retry_count_applies_without_explicit_policy() {
        let settings = OllamaClientBuilder::new().settings(env_with_retries(9));
        assert_eq!(settings.retry, RetryPolicy::default().max_retries(9));
    }

    #[test]
    fn unparsable_environment_leaves_defaults() {
        let env = EnvOverrides::from_lookup(|name| match name {
            config::MAX_RETRIES_ENV | config::TIMEOUT_ENV => Some("many".to_string()),
            _ => None,
        });
        let settings = OllamaClientBuilder::new().settings(env);

        assert_eq!(settings.retry, RetryPolicy::default());
        assert_eq!(settings.timeout, config::default_timeout());
        assert_eq!(settings.base_url, config::DEFAULT_HOST);
    }

    #[test]
    fn environment_fills_unset_connection_settings() {
        let env = EnvOverrides {
            host: Some("http://gpu-box:11434".to_string()),
            api_key: Some("from-env".to_string()),
            timeout: Some(Duration::from_secs(45)),
            max_retries: None,
        };
        let settings = OllamaClientBuilder::new().settings(env);

        assert_eq!(settings.base_url, "http://gpu-box:11434");
        assert_eq!(settings.api_key.as_deref(), Some("from-env"));
        assert_eq!(settings.timeout, Duration::from_secs(45));
    }

    #[test]
    fn explicit_connection_settings_beat_environment() {
        let env = EnvOverrides {
            host: Some("http://gpu-box:11434".to_string()),
            api_key: Some("from-env".to_string()),
            timeout: Some(Duration::from_secs(45)),
            max_retries: None,
        };
        let settings = OllamaClientBuilder::new()
            .base_url("localhost:8080/")
            .api_key("explicit")
            .timeout(Duration::from_secs(5))
            .settings(env);

        assert_eq!(settings.base_url, "http://localhost:8080");
        assert_eq!(settings.api_key.as_deref(), Some("explicit"));
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }
}
