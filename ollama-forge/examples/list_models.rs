use ollama_forge::OllamaClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OllamaClient::builder().build()?;

    println!("Ollama {}", client.version().await?.version);

    let response = client.list_models().await?;

    for model in response.models {
        println!(
            "{:<40} {:>8} {:>10.1} GB",
            model.name,
            model.details.parameter_size,
            model.size as f64 / 1e9
        );
    }

    Ok(())
}
