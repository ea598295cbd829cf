use futures::StreamExt;
use ragkit::prelude::*;
use ragkit::providers::completions::Gemini;
use std::io::Write;

#[tokio::main]
async fn main() -> ragkit::error::Result<()> {
    tracing_subscriber::fmt::init();

    let config = GeminiConfig::from_env()?;
    let mut chat = ChatSession::new(Gemini::new(&config)?)
        .with_preamble("You are a terse assistant, answer in one or two sentences")
        .with_max_turns(4);

    let reply = chat.send("My favourite language is Rust.").await?;
    println!("> {}", reply.text);

    // streams a one-off reply on top of the session's history
    let model = Gemini::new(&config)?;
    let mut stream = model
        .stream(
            Message::User("Write a haiku about my favourite language".to_string()),
            chat.export_history(),
            chat.config(),
        )
        .await?;
    while let Some(fragment) = stream.next().await {
        print!("{}", fragment?);
        _ = std::io::stdout().flush();
    }
    println!();

    println!("tokens used by the session: {:?}", chat.token_usage().total_tokens);
    Ok(())
}
