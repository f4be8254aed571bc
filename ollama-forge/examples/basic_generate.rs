use ollama_forge::types::generate::SimpleGenerateRequest;
use ollama_forge::types::ModelOptions;
use ollama_forge::OllamaClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OllamaClient::builder().build()?;

    let request = SimpleGenerateRequest::new("llama3.2:3b", "Why is the sky blue?")
        .options(ModelOptions::new().temperature(0.2).num_predict(128));

    let response = client.generate_simple(request).await?;

    println!("{}", response.response);
    println!(
        "\n({} tokens in {:.2}s)",
        response.eval_count,
        response.total_duration as f64 / 1e9
    );

    Ok(())
}
