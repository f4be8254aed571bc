use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use ollama_forge::config::{BACKUP_CHAT_MODEL, DEFAULT_CHAT_MODEL};
use ollama_forge::fallback::FallbackPolicy;
use ollama_forge::retry::RetryPolicy;
use ollama_forge::transport::MockTransport;
use ollama_forge::types::chat::{ChatRequestMessage, SimpleChatRequest, StreamingChatRequest};
use ollama_forge::types::embed::EmbedRequest;
use ollama_forge::types::generate::SimpleGenerateRequest;
use ollama_forge::{Error, OllamaClient, Result};

fn instant_retries(max_retries: u32) -> RetryPolicy {
    RetryPolicy::default()
        .max_retries(max_retries)
        .initial_delay(Duration::ZERO)
}

fn requested_models(mock: &MockTransport) -> Vec<String> {
    mock.requests()
        .iter()
        .map(|r| r.model().unwrap_or_default().to_string())
        .collect()
}

fn chat_reply(model: &str, content: &str) -> serde_json::Value {
    json!({
        "model": model,
        "message": {"role": "assistant", "content": content},
        "done": true
    })
}

#[tokio::test]
async fn test_retries_transient_server_error() -> Result<()> {
    let mock = MockTransport::new()
        .with_status(503, "loading model")
        .with_error(Error::Connection("connection refused".to_string()))
        .with_json(json!({"version": "0.5.7"}));
    let client = OllamaClient::builder()
        .transport(Arc::new(mock.clone()))
        .retry_policy(instant_retries(3))
        .build()?;

    assert_eq!(client.version().await?.version, "0.5.7");
    assert_eq!(mock.requests().len(), 3);
    assert_eq!(mock.pending_replies(), 0);
    Ok(())
}

#[tokio::test]
async fn test_gives_up_after_max_retries() -> Result<()> {
    let mock = MockTransport::new()
        .with_error(Error::Timeout("slow".to_string()))
        .with_error(Error::Timeout("slow".to_string()))
        .with_error(Error::Timeout("slow".to_string()))
        .with_json(json!({"version": "never reached"}));
    let client = OllamaClient::builder()
        .transport(Arc::new(mock.clone()))
        .retry_policy(instant_retries(2))
        .build()?;

    assert!(matches!(client.version().await, Err(Error::Timeout(_))));
    assert_eq!(mock.requests().len(), 3);
    assert_eq!(mock.pending_replies(), 1);
    Ok(())
}

#[tokio::test]
async fn test_invalid_request_is_not_retried() -> Result<()> {
    let mock = MockTransport::new().with_status(400, r#"{"error":"bad format"}"#);
    let client = OllamaClient::builder()
        .transport(Arc::new(mock.clone()))
        .retry_policy(instant_retries(4))
        .build()?;

    let result = client
        .generate_simple(SimpleGenerateRequest::new("m", "hi"))
        .await;

    assert!(matches!(result, Err(Error::InvalidRequest(_))));
    assert_eq!(mock.requests().len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_retry_waits_between_attempts() -> Result<()> {
    let mock = MockTransport::new()
        .with_status(502, "")
        .with_status(502, "")
        .with_json(json!({"version": "1"}));
    let client = OllamaClient::builder()
        .transport(Arc::new(mock.clone()))
        .retry_policy(
            RetryPolicy::default()
                .max_retries(2)
                .initial_delay(Duration::from_millis(200))
                .multiplier(2.0),
        )
        .build()?;

    let start = tokio::time::Instant::now();
    client.version().await?;

    // 200ms, then 400ms.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(600));
    assert!(elapsed < Duration::from_millis(700));
    Ok(())
}

#[tokio::test]
async fn test_chat_falls_back_when_primary_missing() -> Result<()> {
    let mock = MockTransport::new()
        .with_status(404, r#"{"error":"model 'deepseek-r1:1.5b' not found"}"#)
        .with_json(chat_reply(BACKUP_CHAT_MODEL, "backup here"));
    let client = OllamaClient::builder()
        .transport(Arc::new(mock.clone()))
        .no_retries()
        .build()?;

    let request = SimpleChatRequest::new(DEFAULT_CHAT_MODEL).add_message(ChatRequestMessage::user("hi"));
    let response = client.chat_simple(request).await?;

    assert_eq!(response.model, BACKUP_CHAT_MODEL);
    assert_eq!(response.message.content, "backup here");
    assert_eq!(
        requested_models(&mock),
        vec![DEFAULT_CHAT_MODEL.to_string(), BACKUP_CHAT_MODEL.to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn test_each_candidate_is_retried_before_falling_back() -> Result<()> {
    let mock = MockTransport::new()
        .with_status(500, "out of memory")
        .with_status(500, "out of memory")
        .with_json(chat_reply("small", "ok"));
    let client = OllamaClient::builder()
        .transport(Arc::new(mock.clone()))
        .retry_policy(instant_retries(1))
        .fallback_policy(FallbackPolicy::empty().with_backup("big", "small"))
        .build()?;

    let request = SimpleChatRequest::new("big").add_message(ChatRequestMessage::user("hi"));
    client.chat_simple(request).await?;

    assert_eq!(requested_models(&mock), vec!["big", "big", "small"]);
    Ok(())
}

#[tokio::test]
async fn test_fallback_chain_exhausted_returns_last_error() -> Result<()> {
    let mock = MockTransport::new()
        .with_status(404, "first missing")
        .with_status(404, "second missing")
        .with_status(404, "third missing");
    let client = OllamaClient::builder()
        .transport(Arc::new(mock.clone()))
        .no_retries()
        .fallback_model("a", "b")
        .fallback_model("a", "c")
        .build()?;

    let result = client
        .generate_simple(SimpleGenerateRequest::new("a", "hi"))
        .await;

    match result {
        Err(Error::ModelNotFound(message)) => assert_eq!(message, "third missing"),
        other => panic!("expected ModelNotFound, got {:?}", other),
    }
    assert_eq!(requested_models(&mock), vec!["a", "b", "c"]);
    Ok(())
}

#[tokio::test]
async fn test_no_fallback_for_invalid_request() -> Result<()> {
    let mock = MockTransport::new()
        .with_status(400, "bad")
        .with_json(chat_reply(BACKUP_CHAT_MODEL, "unused"));
    let client = OllamaClient::builder()
        .transport(Arc::new(mock.clone()))
        .no_retries()
        .build()?;

    let request = SimpleChatRequest::new(DEFAULT_CHAT_MODEL).add_message(ChatRequestMessage::user("hi"));
    assert!(matches!(
        client.chat_simple(request).await,
        Err(Error::InvalidRequest(_))
    ));
    assert_eq!(mock.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_disabled_fallback_tries_only_requested_model() -> Result<()> {
    let mock = MockTransport::new().with_status(404, "missing");
    let client = OllamaClient::builder()
        .transport(Arc::new(mock.clone()))
        .no_retries()
        .disable_fallback()
        .build()?;

    let request = SimpleChatRequest::new(DEFAULT_CHAT_MODEL).add_message(ChatRequestMessage::user("hi"));
    assert!(matches!(
        client.chat_simple(request).await,
        Err(Error::ModelNotFound(_))
    ));
    assert_eq!(requested_models(&mock), vec![DEFAULT_CHAT_MODEL]);
    Ok(())
}

#[tokio::test]
async fn test_stream_falls_back_on_open() -> Result<()> {
    let mock = MockTransport::new()
        .with_status(404, "missing")
        .with_lines(vec![
            r#"{"model":"small","message":{"role":"assistant","content":"from "},"done":false}"#,
            r#"{"model":"small","message":{"role":"assistant","content":"backup"},"done":true}"#,
        ]);
    let client = OllamaClient::builder()
        .transport(Arc::new(mock.clone()))
        .no_retries()
        .fallback_policy(FallbackPolicy::empty().with_backup("big", "small"))
        .build()?;

    let request = StreamingChatRequest::new("big").add_message(ChatRequestMessage::user("hi"));
    let text = client.chat_stream(request).await?.collect_text().await?;

    assert_eq!(text, "from backup");
    assert_eq!(requested_models(&mock), vec!["big", "small"]);
    Ok(())
}

#[tokio::test]
async fn test_embed_falls_back() -> Result<()> {
    let mock = MockTransport::new()
        .with_status(404, "missing")
        .with_json(json!({"model": "small", "embeddings": [[1.0, 0.0]]}));
    let client = OllamaClient::builder()
        .transport(Arc::new(mock.clone()))
        .no_retries()
        .fallback_policy(FallbackPolicy::empty().with_backup("big", "small"))
        .build()?;

    let response = client.embed(EmbedRequest::new("big", "hello")).await?;

    assert_eq!(response.model, "small");
    assert_eq!(requested_models(&mock), vec!["big", "small"]);
    Ok(())
}

#[tokio::test]
async fn test_with_fallback_for_custom_operations() -> Result<()> {
    let mock = MockTransport::new();
    let client = OllamaClient::builder()
        .transport(Arc::new(mock))
        .fallback_policy(FallbackPolicy::empty().with_backup("big", "small"))
        .build()?;

    let mut tried = Vec::new();
    let chosen = client
        .with_fallback("big", |model| {
            tried.push(model.clone());
            async move {
                if model == "big" {
                    Err(Error::ModelNotFound(model))
                } else {
                    Ok(model)
                }
            }
        })
        .await?;

    assert_eq!(chosen, "small");
    assert_eq!(tried, vec!["big", "small"]);
    Ok(())
}

#[tokio::test]
async fn test_mid_stream_error_is_not_retried() -> Result<()> {
    let mock = MockTransport::new()
        .with_lines(vec![
            r#"{"model":"m","message":{"role":"assistant","content":"partial"},"done":false}"#,
            r#"{"error":"model runner crashed"}"#,
        ])
        .with_json(chat_reply("m", "unused"));
    let client = OllamaClient::builder()
        .transport(Arc::new(mock.clone()))
        .retry_policy(instant_retries(3))
        .build()?;

    let request = StreamingChatRequest::new("m").add_message(ChatRequestMessage::user("hi"));
    match client.chat_stream(request).await?.collect_text().await {
        Err(Error::Stream(message)) => assert_eq!(message, "model runner crashed"),
        other => panic!("expected Stream error, got {:?}", other),
    }
    assert_eq!(mock.requests().len(), 1);
    assert_eq!(mock.pending_replies(), 1);
    Ok(())
}

#[tokio::test]
async fn test_ping_is_never_retried() -> Result<()> {
    let mock = MockTransport::new()
        .with_error(Error::Connection("connection refused".to_string()))
        .with_json(json!({"version": "0.5.7"}));
    let client = OllamaClient::builder()
        .transport(Arc::new(mock.clone()))
        .retry_policy(instant_retries(3))
        .build()?;

    assert!(!client.ping().await.is_running());
    assert_eq!(mock.requests().len(), 1);
    assert_eq!(mock.pending_replies(), 1);
    Ok(())
}
