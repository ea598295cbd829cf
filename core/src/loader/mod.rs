//! Loading documents from the filesystem.

mod file_loader;

pub use file_loader::FileLoader;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileLoaderError {
    #[error("Invalid glob-pattern: {0}")]
    InvalidGlobPattern(#[from] glob::PatternError),
    #[error("Failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("No matching documents found")]
    NoMatchingDocuments,
}
