#[derive(Clone, Debug, PartialEq)]
/// Embedding of a document
pub struct Embedding {
    /// A unique identifier for the embedding.
    pub id: String,
    /// The numerical embedding vector of the document's content.
    pub embedded_data: Vec<f64>,
    /// The raw text data from which the embedding was generated.
    pub raw_data: String,
}

impl Embedding {
    pub fn new(id: impl Into<String>, raw_data: impl Into<String>, embedded_data: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            embedded_data,
            raw_data: raw_data.into(),
        }
    }

    /// Length of the embedding vector
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.embedded_data.len()
    }
}
