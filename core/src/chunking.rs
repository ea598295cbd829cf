//! Splitting long text into pieces small enough to embed on their own.

/// How to cut a text into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkStrategy {
    /// Pack whole words into chunks of at most this many characters.
    /// A single word longer than the limit becomes a chunk by itself.
    Size(usize),
    /// Group this many sentences per chunk, sentences end at a `.`
    Sentences(usize),
    /// One chunk per paragraph, paragraphs are separated by a blank line.
    #[default]
    Paragraphs,
}

/// Splits `text` according to `strategy`. Never returns empty chunks.
#[must_use]
pub fn chunk(text: &str, strategy: ChunkStrategy) -> Vec<String> {
    match strategy {
        ChunkStrategy::Size(max_chars) => chunk_by_size(text, max_chars),
        ChunkStrategy::Sentences(per_chunk) => chunk_by_sentences(text, per_chunk),
        ChunkStrategy::Paragraphs => chunk_by_paragraphs(text),
    }
}

fn chunk_by_size(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = vec![];
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn chunk_by_sentences(text: &str, per_chunk: usize) -> Vec<String> {
    let sentences: Vec<String> = text
        .replace('\n', " ")
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{s}."))
        .collect();
    sentences
        .chunks(per_chunk.max(1))
        .map(|group| group.join(" "))
        .collect()
}

fn chunk_by_paragraphs(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToString::to_string)
        .collect()
}
