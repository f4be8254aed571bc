use std::io::Write;

use futures::StreamExt;
use ollama_forge::{
    types::generate::{GenerateStreamEvent, StreamingGenerateRequest},
    OllamaClient,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OllamaClient::builder().build()?;

    let generate_request =
        StreamingGenerateRequest::new("llama3.2:3b", "Tell me a story about a Rust programmer.");

    let mut stream = client.generate_stream(generate_request).await?;

    while let Some(event) = stream.next().await {
        match event {
            Ok(GenerateStreamEvent::MessageChunk(chunk)) => {
                print!("{}", chunk.response);
                std::io::stdout().flush()?;
            }
            Ok(GenerateStreamEvent::Error(error)) => eprintln!("\nServer error: {}", error),
            Ok(GenerateStreamEvent::Partial { .. }) => continue,
            Err(e) => eprintln!("\nStream error: {}", e),
        }
    }
    println!();

    Ok(())
}
