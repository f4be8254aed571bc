use ollama_forge::OllamaClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OllamaClient::builder().build()?;

    let response = client.list_running_models().await?;
    if response.models.is_empty() {
        println!("No models loaded");
    }

    for model in response.models {
        println!("{} (unloads at {})", model.model, model.expires_at);
    }

    Ok(())
}
