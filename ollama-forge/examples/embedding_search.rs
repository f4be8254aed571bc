use ollama_forge::embedding::top_k;
use ollama_forge::types::embed::EmbedRequest;
use ollama_forge::OllamaClient;

const DOCUMENTS: [&str; 4] = [
    "Llamas are members of the camelid family.",
    "Rust guarantees memory safety without a garbage collector.",
    "The Eiffel Tower is in Paris.",
    "Tokio is an asynchronous runtime for Rust.",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OllamaClient::builder().build()?;
    let model = "all-minilm";

    let documents: Vec<String> = DOCUMENTS.iter().map(|d| d.to_string()).collect();
    let corpus = client.embed(EmbedRequest::new(model, documents)).await?;

    let query = client
        .embed(EmbedRequest::new(model, "async programming in Rust"))
        .await?;
    let query = query.first().ok_or("no embedding returned")?;

    for (index, score) in top_k(query, &corpus.embeddings, 2) {
        println!("{:.3}  {}", score, DOCUMENTS[index]);
    }

    Ok(())
}
