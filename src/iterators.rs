//! Sentence collections
//!
//! A [`Treebank`] is a source of sentences: an in-memory string, a file, or
//! several files read in the given order. Iterating a `Treebank` directly
//! skips unreadable files and unparseable sentences, logging each skip;
//! [`Treebank::sentences`] reports them instead.

use crate::conllu::{CoNLLUReader, ParseError};
use crate::tree::Sentence;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Error while reading a treebank
#[derive(Debug, Error)]
pub enum TreebankError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("Failed to open file {}: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of sentences for a collection
#[derive(Debug, Clone)]
enum Source {
    /// In-memory CoNLL-U text
    String(String),
    /// File paths, read in order
    Files(Vec<PathBuf>),
}

/// Collection of sentences from a string or CoNLL-U files
///
/// # Examples
///
/// ```no_run
/// use transitives::{Treebank, find_transitive_linear};
///
/// let treebank = Treebank::from_file("en_pud-ud-test.conllu");
/// for sentence in treebank {
///     println!("{} linear matches", find_transitive_linear(&sentence).len());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Treebank {
    source: Source,
}

impl Treebank {
    /// Create from an in-memory CoNLL-U string
    pub fn from_string(text: &str) -> Self {
        Self {
            source: Source::String(text.to_string()),
        }
    }

    /// Create from a single file path (plain or `.gz`)
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self::from_paths(vec![path.as_ref().to_path_buf()])
    }

    /// Create from explicit file paths
    pub fn from_paths(file_paths: Vec<PathBuf>) -> Self {
        Self {
            source: Source::Files(file_paths),
        }
    }

    /// Iterate over sentences, yielding errors rather than skipping them
    pub fn sentences(&self) -> Box<dyn Iterator<Item = Result<Sentence, TreebankError>> + Send> {
        match &self.source {
            Source::String(text) => Box::new(
                CoNLLUReader::from_string(text).map(|result| result.map_err(TreebankError::from)),
            ),
            Source::Files(paths) => {
                Box::new(paths.clone().into_iter().flat_map(open_file_sentences))
            }
        }
    }

    /// Read every sentence, failing on the first error
    pub fn load(&self) -> Result<Vec<Sentence>, TreebankError> {
        self.sentences().collect()
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = Sentence> + Send> {
        self.clone().into_iter()
    }
}

impl IntoIterator for Treebank {
    type Item = Sentence;
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + Send>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.sentences().filter_map(|result| match result {
            Ok(sentence) => Some(sentence),
            Err(e) => {
                warn!("Skipping input: {}", e);
                None
            }
        }))
    }
}

/// Open a file and iterate over its sentences
///
/// A file that cannot be opened yields a single `FileOpen` error.
fn open_file_sentences(
    path: PathBuf,
) -> Box<dyn Iterator<Item = Result<Sentence, TreebankError>> + Send> {
    match CoNLLUReader::from_file(&path) {
        Ok(reader) => Box::new(reader.map(|result| result.map_err(TreebankError::from))),
        Err(source) => Box::new(std::iter::once(Err(TreebankError::FileOpen { path, source }))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const TWO_SENTENCES: &str = "# text = The dog runs.\n\
1\tThe\tthe\tDET\tDT\t_\t2\tdet\t_\t_\n\
2\tdog\tdog\tNOUN\tNN\t_\t3\tnsubj\t_\t_\n\
3\truns\trun\tVERB\tVBZ\t_\t0\troot\t_\t_\n\
\n\
# text = Cats sleep.\n\
1\tCats\tcat\tNOUN\tNNS\t_\t2\tnsubj\t_\t_\n\
2\tsleep\tsleep\tVERB\tVBP\t_\t0\troot\t_\t_\n\
\n";

    /// Helper to create test files with given content
    fn create_test_files(contents: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
        let dir = tempdir().unwrap();
        let mut paths = Vec::new();

        for (filename, content) in contents {
            let path = dir.path().join(filename);
            fs::write(&path, content).unwrap();
            paths.push(path);
        }

        (dir, paths)
    }

    #[test]
    fn test_treebank_from_string() {
        let sentences: Vec<_> = Treebank::from_string(TWO_SENTENCES).into_iter().collect();

        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].len(), 3);
        assert_eq!(sentences[1].text.as_deref(), Some("Cats sleep."));
    }

    #[test]
    fn test_treebank_from_paths_keeps_order() {
        let (_dir, paths) = create_test_files(&[
            ("b.conllu", "1\truns\trun\tVERB\tVBZ\t_\t0\troot\t_\t_\n"),
            ("a.conllu", TWO_SENTENCES),
        ]);

        let sentences = Treebank::from_paths(paths).load().unwrap();
        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0].tokens[0].form, "runs");
        assert_eq!(sentences[1].tokens[0].form, "The");
    }

    #[test]
    fn test_skips_bad_files_and_sentences() {
        let (dir, paths) = create_test_files(&[(
            "good.conllu",
            "1\truns\trun\tVERB\tVBZ\t_\t0\troot\t_\t_\n\n1\tbroken\n\n",
        )]);
        let missing = dir.path().join("nonexistent.conllu");
        let treebank = Treebank::from_paths(vec![paths[0].clone(), missing, paths[0].clone()]);

        assert_eq!(treebank.iter().count(), 2);

        let results: Vec<_> = treebank.sentences().collect();
        assert_eq!(results.len(), 5);
        assert!(matches!(results[1], Err(TreebankError::Parse(_))));
        assert!(matches!(results[2], Err(TreebankError::FileOpen { .. })));
        assert!(treebank.load().is_err());
    }

    #[test]
    fn test_error_display() {
        let err = TreebankError::FileOpen {
            path: PathBuf::from("missing.conllu"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "Failed to open file missing.conllu: not found");
    }
}
