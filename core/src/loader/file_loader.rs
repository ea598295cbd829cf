use glob::{glob, Pattern};
use std::{collections::HashSet, path::PathBuf};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use super::FileLoaderError;
use crate::document::Document;

/// Loads text files matching a set of glob patterns as [`Document`]s.
///
/// A pattern that matches a directory pulls in every file below it. Each
/// document's id is the path of the file it was read from, so a file matched
/// by several patterns is only loaded once.
#[derive(Debug, Clone)]
pub struct FileLoader {
    patterns: Vec<Pattern>,
}

impl FileLoader {
    /// Fails with [`FileLoaderError::InvalidGlobPattern`] on the first
    /// pattern that doesn't parse.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, FileLoaderError> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    /// Reads every matching file as UTF-8 text.
    ///
    /// Files are returned in path order per pattern, patterns in the order
    /// they were given.
    #[instrument(skip(self), fields(patterns = self.patterns.len()))]
    pub async fn load(&self) -> Result<Vec<Document>, FileLoaderError> {
        let files = self.resolve_files()?;
        if files.is_empty() {
            return Err(FileLoaderError::NoMatchingDocuments);
        }

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            let id = path.to_string_lossy().into_owned();
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| FileLoaderError::Io {
                    path: id.clone(),
                    source,
                })?;
            debug!(path = %id, bytes = text.len(), "Loaded file");
            documents.push(Document::new_with_id(id, text));
        }
        info!(documents = documents.len(), "Loaded documents");
        Ok(documents)
    }

    fn resolve_files(&self) -> Result<Vec<PathBuf>, FileLoaderError> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        let mut push = |path: PathBuf| {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        };

        for pattern in &self.patterns {
            for entry in glob(pattern.as_str())? {
                let path = match entry {
                    Ok(path) => path,
                    Err(e) => {
                        warn!(error = %e, "Skipping unreadable glob match");
                        continue;
                    }
                };
                if path.is_dir() {
                    for entry in WalkDir::new(&path).sort_by_file_name() {
                        let entry = entry.map_err(|e| FileLoaderError::Io {
                            path: path.to_string_lossy().into_owned(),
                            source: e.into(),
                        })?;
                        if entry.file_type().is_file() {
                            push(entry.into_path());
                        }
                    }
                } else if path.is_file() {
                    push(path);
                }
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("b.md"), "bravo").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.txt"), "charlie").unwrap();
        dir
    }

    fn pattern(dir: &TempDir, suffix: &str) -> String {
        format!("{}/{suffix}", dir.path().display())
    }

    #[tokio::test]
    async fn loads_matching_files_with_path_ids() {
        let dir = fixture();
        let loader = FileLoader::new(&[pattern(&dir, "*.txt")]).unwrap();
        let docs = loader.load().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "alpha");
        assert_eq!(
            docs[0].id,
            dir.path().join("a.txt").to_string_lossy().into_owned()
        );
    }

    #[tokio::test]
    async fn directories_are_walked_recursively() {
        let dir = fixture();
        let loader = FileLoader::new(&[dir.path().display().to_string()]).unwrap();
        let mut texts: Vec<_> = loader
            .load()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.text)
            .collect();
        texts.sort();
        assert_eq!(texts, vec!["alpha", "bravo", "charlie"]);
    }

    #[tokio::test]
    async fn overlapping_patterns_load_a_file_once() {
        let dir = fixture();
        let loader =
            FileLoader::new(&[pattern(&dir, "*.txt"), pattern(&dir, "a.*")]).unwrap();
        assert_eq!(loader.load().await.unwrap().len(), 1);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(matches!(
            FileLoader::new(&["[unclosed"]),
            Err(FileLoaderError::InvalidGlobPattern(_))
        ));
    }

    #[tokio::test]
    async fn no_match_is_an_error() {
        let dir = fixture();
        let loader = FileLoader::new(&[pattern(&dir, "*.pdf")]).unwrap();
        assert!(matches!(
            loader.load().await,
            Err(FileLoaderError::NoMatchingDocuments)
        ));
    }

    #[tokio::test]
    async fn non_utf8_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bin.txt"), [0xff, 0xfe, 0x00]).unwrap();
        let loader = FileLoader::new(&[pattern(&dir, "*.txt")]).unwrap();
        assert!(matches!(
            loader.load().await,
            Err(FileLoaderError::Io { .. })
        ));
    }
}
