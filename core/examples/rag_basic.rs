use ragkit::prelude::*;
use ragkit::providers::{completions::Gemini, embeddings::GeminiEmbedding};

// Indexes the files matched by the glob given as first argument, or a couple
// of inline documents when there's none, then answers the remaining arguments.
#[tokio::main]
async fn main() -> ragkit::error::Result<()> {
    tracing_subscriber::fmt::init();

    let config = GeminiConfig::from_env()?;
    let index = SemanticIndex::new(GeminiEmbedding::new(&config)?);

    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(pattern) => {
            for doc in FileLoader::new(&[pattern])?.load().await? {
                index
                    .ingest_chunked(&doc.id, &doc.text, ChunkStrategy::Paragraphs)
                    .await?;
            }
        }
        None => {
            index
                .ingest_documents(&[
                    Document::new_with_id("doc1", "Python is a programming language"),
                    Document::new_with_id("doc2", "Cats are popular pets"),
                    Document::new_with_id("doc3", "Rust guarantees memory safety without a garbage collector"),
                ])
                .await?;
        }
    }

    let question = args.collect::<Vec<_>>().join(" ");
    let question = if question.is_empty() {
        "What is Python?".to_string()
    } else {
        question
    };

    let rag = RagPipeline::new(index, Gemini::new(&config)?)
        .with_config(GenerationConfig::default().temperature(0.2));
    let answer = rag.answer(&question, 2).await?;

    println!("{}", answer.text);
    for source in &answer.sources {
        println!("  [{:.3}] {}", source.score, source.id);
    }
    Ok(())
}
