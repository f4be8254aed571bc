use ollama_forge::types::chat::{ChatRequestMessage, SimpleChatRequest};
use ollama_forge::OllamaClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OllamaClient::builder().build()?;

    let chat_request = SimpleChatRequest::new("llama3.2:3b")
        .add_message(ChatRequestMessage::system("Answer in one sentence."))
        .add_message(ChatRequestMessage::user("What is the capital of France?"));

    let chat_response = client.chat_simple(chat_request).await?;

    println!("Response: {}", chat_response.message.content);

    Ok(())
}
