use std::io::Write;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use ollama_forge::types::chat::{ChatRequestMessage, ChatStreamEvent, StreamingChatRequest};
use ollama_forge::{Error, OllamaClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OllamaClient::builder().build()?;

    let request = StreamingChatRequest::new("llama3.2:3b")
        .add_message(ChatRequestMessage::user("Explain ownership in Rust."));

    // Ctrl-C stops the answer without killing the process.
    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let mut stream = client.chat_stream(request).await?.cancel_on(token);

    while let Some(event) = stream.next().await {
        match event {
            Ok(ChatStreamEvent::Message(response)) => {
                print!("{}", response.message.content);
                std::io::stdout().flush()?;
            }
            Ok(ChatStreamEvent::Error(error)) => eprintln!("\nServer error: {}", error),
            Ok(ChatStreamEvent::Partial { partial, .. }) => eprintln!("\nSkipped: {}", partial),
            Err(Error::Cancelled) => {
                println!("\n[cancelled]");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }
    println!();

    Ok(())
}
