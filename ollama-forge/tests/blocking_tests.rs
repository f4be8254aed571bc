use std::sync::Arc;

use serde_json::json;

use ollama_forge::transport::MockTransport;
use ollama_forge::types::chat::{ChatRequestMessage, SimpleChatRequest};
use ollama_forge::types::generate::{GenerateStreamEvent, StreamingGenerateRequest};
use ollama_forge::types::{PullModelRequest, ServerStatus};
use ollama_forge::{Error, OllamaClient, Result};

#[test]
fn test_blocking_chat_simple() -> Result<()> {
    let mock = MockTransport::new().with_json(json!({
        "model": "m",
        "message": {"role": "assistant", "content": "hi there"},
        "done": true
    }));
    let client = OllamaClient::builder()
        .transport(Arc::new(mock.clone()))
        .no_retries()
        .build_blocking()?;

    let response =
        client.chat_simple(SimpleChatRequest::new("m").add_message(ChatRequestMessage::user("hi")))?;

    assert_eq!(response.message.content, "hi there");
    assert_eq!(mock.requests()[0].path, "/api/chat");
    Ok(())
}

#[test]
fn test_blocking_stream_is_an_iterator() -> Result<()> {
    let mock = MockTransport::new().with_lines(vec![
        r#"{"model":"m","response":"one ","done":false}"#,
        r#"{"model":"m","response":"two","done":true}"#,
    ]);
    let client = OllamaClient::builder()
        .transport(Arc::new(mock))
        .no_retries()
        .build_blocking()?;

    let chunks: Vec<String> = client
        .generate_stream(StreamingGenerateRequest::new("m", "count"))?
        .map(|event| match event {
            Ok(GenerateStreamEvent::MessageChunk(chunk)) => chunk.response,
            other => panic!("unexpected event {:?}", other),
        })
        .collect();

    assert_eq!(chunks, vec!["one ", "two"]);
    Ok(())
}

#[test]
fn test_blocking_collect_text_and_errors() -> Result<()> {
    let mock = MockTransport::new()
        .with_lines(vec![r#"{"model":"m","response":"done","done":true}"#])
        .with_status(404, "missing")
        .with_lines(vec![r#"{"status":"success"}"#]);
    let client = OllamaClient::builder()
        .transport(Arc::new(mock))
        .no_retries()
        .disable_fallback()
        .build_blocking()?;

    let text = client
        .generate_stream(StreamingGenerateRequest::new("m", "x"))?
        .collect_text()?;
    assert_eq!(text, "done");

    assert!(matches!(
        client.delete_model("ghost"),
        Err(Error::ModelNotFound(_))
    ));

    let progress: Vec<_> = client
        .pull_model_stream(PullModelRequest::new("m"))?
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(progress.len(), 1);
    Ok(())
}

#[test]
fn test_blocking_ping() -> Result<()> {
    let mock = MockTransport::new()
        .with_json(json!({"version": "0.5.7"}))
        .with_error(Error::Connection("connection refused".to_string()));
    let client = OllamaClient::builder()
        .transport(Arc::new(mock))
        .no_retries()
        .build_blocking()?;

    assert_eq!(
        client.ping(),
        ServerStatus::Running {
            version: "0.5.7".to_string()
        }
    );
    assert!(!client.is_running());
    Ok(())
}
