/// A piece of text to be embedded and stored in an index.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    /// Creates a document with a random UUID v4 id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
        }
    }

    pub fn new_with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}
