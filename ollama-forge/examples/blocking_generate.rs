use ollama_forge::types::generate::StreamingGenerateRequest;
use ollama_forge::OllamaClient;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OllamaClient::builder().build_blocking()?;

    let request = StreamingGenerateRequest::new("llama3.2:3b", "Write a haiku about compilers.");
    let text = client.generate_stream(request)?.collect_text()?;

    println!("{}", text);

    Ok(())
}
