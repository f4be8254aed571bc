//! Default settings and the environment variables that override them.

use std::time::Duration;

/// Server address used when neither the builder nor `OLLAMA_HOST` provide one.
pub const DEFAULT_HOST: &str = "http://127.0.0.1:11434";

pub const DEFAULT_CHAT_MODEL: &str = "deepseek-r1:1.5b";
pub const BACKUP_CHAT_MODEL: &str = "qwen2.5:0.5b-Instruct";
pub const DEFAULT_EMBEDDING_MODEL: &str = DEFAULT_CHAT_MODEL;
pub const BACKUP_EMBEDDING_MODEL: &str = BACKUP_CHAT_MODEL;

pub const HOST_ENV: &str = "OLLAMA_HOST";
pub const API_KEY_ENV: &str = "OLLAMA_API_KEY";
pub const TIMEOUT_ENV: &str = "OLLAMA_FORGE_TIMEOUT_SECS";
pub const MAX_RETRIES_ENV: &str = "OLLAMA_FORGE_MAX_RETRIES";

/// Bound on the health check in [`OllamaClient::ping`](crate::OllamaClient::ping).
pub const PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Variables whose presence marks a CI runner.
const CI_ENVS: [&str; 4] = ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "TRAVIS"];

const MIN_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 120;
const TIMEOUT_SECS_PER_CPU: u64 = 15;

/// Request timeout scaled to the host: 15s per CPU, clamped to 30..=120s,
/// halved on CI runners.
pub fn default_timeout() -> Duration {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get() as u64)
        .unwrap_or(2);
    let on_ci = is_ci(|name| std::env::var_os(name).is_some());
    Duration::from_secs(timeout_secs_for(cpus, on_ci))
}

fn is_ci(present: impl Fn(&str) -> bool) -> bool {
    CI_ENVS.iter().any(|name| present(name))
}

fn timeout_secs_for(cpus: u64, on_ci: bool) -> u64 {
    let secs = (cpus * TIMEOUT_SECS_PER_CPU).clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
    if on_ci {
        secs / 2
    } else {
        secs
    }
}

/// Windows gets one retry fewer; its connection failures tend to be persistent.
pub fn default_max_retries() -> u32 {
    if cfg!(windows) {
        3
    } else {
        4
    }
}

/// Accepts the same `OLLAMA_HOST` forms as the Ollama CLI, where the scheme
/// is optional (`localhost:11434`, `0.0.0.0`).
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

/// Settings taken from the environment. Unset, blank and unparsable
/// variables are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct EnvOverrides {
    pub(crate) host: Option<String>,
    pub(crate) api_key: Option<String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) max_retries: Option<u32>,
}

impl EnvOverrides {
    pub(crate) fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: lookup(HOST_ENV)
                .filter(|h| !h.trim().is_empty())
                .map(|h| normalize_host(&h)),
            api_key: lookup(API_KEY_ENV).filter(|k| !k.is_empty()),
            timeout: parse_u64(TIMEOUT_ENV, lookup(TIMEOUT_ENV))
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            max_retries: parse_u64(MAX_RETRIES_ENV, lookup(MAX_RETRIES_ENV))
                .and_then(|n| u32::try_from(n).ok()),
        }
    }
}

fn parse_u64(name: &str, raw: Option<String>) -> Option<u64> {
    let raw = raw?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(variable = name, value = %raw, "ignoring non-numeric environment override");
            #[cfg(not(feature = "tracing"))]
            let _ = name;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_clamped_between_bounds() {
        assert_eq!(timeout_secs_for(1, false), 30);
        assert_eq!(timeout_secs_for(4, false), 60);
        assert_eq!(timeout_secs_for(64, false), 120);
    }

    fn env(vars: &[(&str, &str)]) -> EnvOverrides {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvOverrides::from_lookup(|name| {
            vars.iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        })
    }

    #[test]
    fn any_known_ci_variable_counts() {
        assert!(is_ci(|name| name == "GITHUB_ACTIONS"));
        assert!(is_ci(|name| name == "GITLAB_CI"));
        assert!(is_ci(|name| name == "TRAVIS"));
        assert!(is_ci(|name| name == "CI"));
        assert!(!is_ci(|name| name == "JENKINS_HOME"));
    }

    #[test]
    fn empty_environment_overrides_nothing() {
        assert_eq!(env(&[]), EnvOverrides::default());
    }

    #[test]
    fn numeric_overrides_are_parsed() {
        let overrides = env(&[
            (TIMEOUT_ENV, " 45 "),
            (MAX_RETRIES_ENV, "7"),
            (API_KEY_ENV, "secret"),
        ]);
        assert_eq!(overrides.timeout, Some(Duration::from_secs(45)));
        assert_eq!(overrides.max_retries, Some(7));
        assert_eq!(overrides.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn unparsable_overrides_are_ignored() {
        let overrides = env(&[
            (TIMEOUT_ENV, "soon"),
            (MAX_RETRIES_ENV, "-1"),
            (API_KEY_ENV, ""),
        ]);
        assert_eq!(overrides, EnvOverrides::default());
        assert_eq!(env(&[(MAX_RETRIES_ENV, "99999999999")]).max_retries, None);
        assert_eq!(env(&[(TIMEOUT_ENV, "0")]).timeout, None);
    }

    #[test]
    fn host_override_is_normalized() {
        assert_eq!(
            env(&[(HOST_ENV, "0.0.0.0:11434/")]).host.as_deref(),
            Some("http://0.0.0.0:11434")
        );
        assert_eq!(env(&[(HOST_ENV, "  ")]).host, None);
    }

    #[test]
    fn timeout_is_halved_on_ci() {
        assert_eq!(timeout_secs_for(4, true), 30);
        assert_eq!(timeout_secs_for(1, true), 15);
    }

    #[test]
    fn host_without_scheme_gets_http() {
        assert_eq!(normalize_host("localhost:11434"), "http://localhost:11434");
        assert_eq!(normalize_host(" 0.0.0.0 "), "http://0.0.0.0");
    }

    #[test]
    fn host_with_scheme_is_kept() {
        assert_eq!(
            normalize_host("https://ollama.example.com/"),
            "https://ollama.example.com"
        );
    }
}
