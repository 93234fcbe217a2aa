//! Transitives: transitive clause extraction from dependency parses
//!
//! Compares two ways of finding (predicate, subject, object) triples in
//! Universal Dependencies treebanks: a linear NOUN VERB NOUN tag pattern and
//! a dependency tree pattern applied with a generic tree search.

pub mod conllu; // CoNLL-U file parsing
pub mod iterators; // Sentence collections from strings and files
pub mod reference; // Reference answer sets and checking
pub mod searcher; // Generic pre-order tree search
pub mod transitive; // Linear and tree-based clause matchers
pub mod tree; // Tokens, sentences and dependency trees

// Re-exports for convenience
pub use conllu::{CoNLLUReader, ParseError};
pub use iterators::{Treebank, TreebankError};
pub use reference::{
    ClauseRecord, Comparison, Outcome, RecordSet, ReferenceError, ReferenceSet, check,
};
pub use searcher::search;
pub use transitive::{
    Transitive, extract_transitive, find_transitive_linear, find_transitive_tree,
};
pub use tree::{DepTree, Sentence, Token, TokenId, TreeError, Upos};
