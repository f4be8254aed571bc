use ollama_forge::config::DEFAULT_CHAT_MODEL;
use ollama_forge::retry::RetryPolicy;
use ollama_forge::types::chat::{ChatRequestMessage, SimpleChatRequest};
use ollama_forge::OllamaClient;

/// Logs every retry and model substitution to stderr.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let client = OllamaClient::builder()
        .retry_policy(RetryPolicy::default().max_retries(2))
        .fallback_model(DEFAULT_CHAT_MODEL, "llama3.2:1b")
        .build()?;

    let request = SimpleChatRequest::new(DEFAULT_CHAT_MODEL)
        .add_message(ChatRequestMessage::user("Name three prime numbers."));

    let response = client.chat_simple(request).await?;
    println!("[{}] {}", response.model, response.message.content);

    Ok(())
}
