//! Transitive clause matchers
//!
//! Two ways of finding (predicate, subject, object) triples:
//!
//! - [`extract_transitive`] looks at one dependency subtree: a VERB head with
//!   NOUN `nsubj` and NOUN `obj` dependents. Use it with
//!   [`search`](crate::searcher::search) to cover a whole tree.
//! - [`find_transitive_linear`] ignores the dependency structure and scans
//!   the token sequence for adjacent NOUN VERB NOUN tags.

use crate::searcher::search;
use crate::tree::{DepTree, Sentence, Token, Upos};

/// A matched transitive clause; the tokens are borrowed from the sentence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transitive<'s> {
    pub predicate: &'s Token,
    pub subject: &'s Token,
    pub object: &'s Token,
}

impl<'s> Transitive<'s> {
    pub fn new(predicate: &'s Token, subject: &'s Token, object: &'s Token) -> Self {
        Self {
            predicate,
            subject,
            object,
        }
    }

    /// Forms of predicate, subject and object
    pub fn forms(&self) -> (&'s str, &'s str, &'s str) {
        (
            self.predicate.form.as_str(),
            self.subject.form.as_str(),
            self.object.form.as_str(),
        )
    }
}

impl<'s> From<Transitive<'s>> for (&'s Token, &'s Token, &'s Token) {
    fn from(t: Transitive<'s>) -> Self {
        (t.predicate, t.subject, t.object)
    }
}

/// Match a transitive clause headed by the root of `tree`
///
/// Only direct dependents are considered. If several dependents qualify as
/// subject (or object), the last one in child order is used.
pub fn extract_transitive<'s>(tree: &DepTree<'s>) -> Option<Transitive<'s>> {
    let predicate = tree.token;
    if !predicate.has_upos(Upos::Verb) {
        return None;
    }

    let mut subject = None;
    let mut object = None;
    for child in tree {
        let dependent = child.token;
        if !dependent.has_upos(Upos::Noun) {
            continue;
        }
        if dependent.has_deprel("nsubj") {
            subject = Some(dependent);
        } else if dependent.has_deprel("obj") {
            object = Some(dependent);
        }
    }

    Some(Transitive::new(predicate, subject?, object?))
}

/// All transitive clauses in a dependency tree, in pre-order
pub fn find_transitive_tree<'s>(tree: &DepTree<'s>) -> Vec<Transitive<'s>> {
    search(tree, extract_transitive)
}

/// Find all NOUN VERB NOUN sequences in a sentence
///
/// A rough approximation of transitive clauses with noun-headed subject and
/// object in SVO languages. Overlapping windows each produce a match.
pub fn find_transitive_linear(sentence: &Sentence) -> Vec<Transitive<'_>> {
    sentence
        .tokens
        .windows(3)
        .filter_map(|window| match window {
            [subject, predicate, object]
                if subject.has_upos(Upos::Noun)
                    && predicate.has_upos(Upos::Verb)
                    && object.has_upos(Upos::Noun) =>
            {
                Some(Transitive::new(predicate, subject, object))
            }
            _ => None,
        })
        .collect()
}
