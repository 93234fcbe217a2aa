//! Reference answer sets
//!
//! Matches are reduced to [`ClauseRecord`]s (sentence text plus the forms of
//! predicate, subject and object) so that they can be stored as JSON and
//! compared as sets against what the matchers find.

use crate::transitive::{Transitive, find_transitive_linear, find_transitive_tree};
use crate::tree::Sentence;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid reference data: {0}")]
    Json(#[from] serde_json::Error),
}

/// A match reduced to strings
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClauseRecord {
    pub text: String,
    pub predicate: String,
    pub subject: String,
    pub object: String,
}

impl ClauseRecord {
    pub fn new(text: &str, predicate: &str, subject: &str, object: &str) -> Self {
        Self {
            text: text.to_string(),
            predicate: predicate.to_string(),
            subject: subject.to_string(),
            object: object.to_string(),
        }
    }

    /// Record a match found in `sentence`
    pub fn from_match(sentence: &Sentence, clause: &Transitive) -> Self {
        let (predicate, subject, object) = clause.forms();
        Self::new(
            sentence.text.as_deref().unwrap_or_default(),
            predicate,
            subject,
            object,
        )
    }
}

pub type RecordSet = BTreeSet<ClauseRecord>;

/// Records for all linear (NOUN VERB NOUN) matches in `sentences`
pub fn linear_records<'a>(sentences: impl IntoIterator<Item = &'a Sentence>) -> RecordSet {
    let mut records = RecordSet::new();
    for sentence in sentences {
        for clause in find_transitive_linear(sentence) {
            records.insert(ClauseRecord::from_match(sentence, &clause));
        }
    }
    debug!("Linear matcher found {} distinct clauses", records.len());
    records
}

/// Records for all dependency tree matches in `sentences`
///
/// Sentences that do not form a valid tree contribute nothing.
pub fn tree_records<'a>(sentences: impl IntoIterator<Item = &'a Sentence>) -> RecordSet {
    let mut records = RecordSet::new();
    for sentence in sentences {
        let tree = match sentence.to_tree() {
            Ok(tree) => tree,
            Err(e) => {
                warn!(
                    sent_id = sentence.sent_id().unwrap_or("?"),
                    "Skipping sentence: {}", e
                );
                continue;
            }
        };
        for clause in find_transitive_tree(&tree) {
            records.insert(ClauseRecord::from_match(sentence, &clause));
        }
    }
    debug!("Tree matcher found {} distinct clauses", records.len());
    records
}

/// Expected matches for both methods
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSet {
    pub linear: RecordSet,
    pub tree: RecordSet,
}

impl ReferenceSet {
    /// Compute a reference set by running both matchers
    pub fn from_sentences(sentences: &[Sentence]) -> Self {
        Self {
            linear: linear_records(sentences),
            tree: tree_records(sentences),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ReferenceError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        let file = File::open(path).map_err(|source| ReferenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reference: Self = serde_json::from_reader(BufReader::new(file))?;
        debug!(
            linear = reference.linear.len(),
            tree = reference.tree.len(),
            "Loaded reference set from {}",
            path.display()
        );
        Ok(reference)
    }

    pub fn save(&self, path: &Path) -> Result<(), ReferenceError> {
        let io_error = |source| ReferenceError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n").map_err(io_error)?;
        writer.flush().map_err(io_error)
    }
}

/// Difference between what was found and what was expected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Expected but not found
    pub missing: RecordSet,
    /// Found but not expected
    pub extra: RecordSet,
}

impl Comparison {
    pub fn new(found: &RecordSet, expected: &RecordSet) -> Self {
        Self {
            missing: expected.difference(found).cloned().collect(),
            extra: found.difference(expected).cloned().collect(),
        }
    }

    pub fn passed(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Shows one example of each kind of discrepancy; empty when passed
impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            return Ok(());
        }
        writeln!(f, "In the following sentence:")?;
        if let Some(r) = self.missing.first() {
            writeln!(f, "{}", r.text)?;
            writeln!(
                f,
                "  MISSING verb/subject/object: {} {} {}",
                r.predicate, r.subject, r.object
            )?;
        }
        if let Some(r) = self.extra.first() {
            writeln!(f, "{}", r.text)?;
            writeln!(
                f,
                "  UNEXPECTED verb/subject/object: {} {} {}",
                r.predicate, r.subject, r.object
            )?;
        }
        Ok(())
    }
}

/// Result of checking a corpus against a reference set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Linear matches differ; the tree method was not checked
    Failed,
    /// Linear matches agree, tree matches differ
    Passed,
    /// Both methods agree with the reference
    PassedWithDistinction,
}

/// Check the linear method, then (only if it passes) the tree method
///
/// Progress and the first discrepancy of each failing step go to `out`.
pub fn check(
    sentences: &[Sentence],
    reference: &ReferenceSet,
    out: &mut impl Write,
) -> io::Result<Outcome> {
    writeln!(out, "Testing find_transitive_linear...")?;
    let linear = Comparison::new(&linear_records(sentences), &reference.linear);
    write!(out, "{}", linear)?;
    if !linear.passed() {
        writeln!(out, "FAILED.")?;
        return Ok(Outcome::Failed);
    }
    writeln!(out, "PASSED.")?;

    writeln!(out, "Testing tree_search with extract_transitive...")?;
    let tree = Comparison::new(&tree_records(sentences), &reference.tree);
    write!(out, "{}", tree)?;
    if tree.passed() {
        writeln!(out, "PASSED WITH DISTINCTION.")?;
        Ok(Outcome::PassedWithDistinction)
    } else {
        writeln!(out, "NO DISTINCTION.")?;
        Ok(Outcome::Passed)
    }
}
