//! Sentence and dependency tree data structures
//!
//! A [`Sentence`] owns its tokens in file order. A [`DepTree`] is a view
//! over the syntactic words of a sentence: each node borrows one token and
//! owns its dependents in sentence order.

use rustc_hash::FxHashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Universal part-of-speech tag (Universal Dependencies v2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Upos {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    X,
}

impl Upos {
    pub const ALL: [Upos; 17] = [
        Upos::Adj,
        Upos::Adp,
        Upos::Adv,
        Upos::Aux,
        Upos::Cconj,
        Upos::Det,
        Upos::Intj,
        Upos::Noun,
        Upos::Num,
        Upos::Part,
        Upos::Pron,
        Upos::Propn,
        Upos::Punct,
        Upos::Sconj,
        Upos::Sym,
        Upos::Verb,
        Upos::X,
    ];

    /// The tag as written in CoNLL-U
    pub fn as_str(self) -> &'static str {
        match self {
            Upos::Adj => "ADJ",
            Upos::Adp => "ADP",
            Upos::Adv => "ADV",
            Upos::Aux => "AUX",
            Upos::Cconj => "CCONJ",
            Upos::Det => "DET",
            Upos::Intj => "INTJ",
            Upos::Noun => "NOUN",
            Upos::Num => "NUM",
            Upos::Part => "PART",
            Upos::Pron => "PRON",
            Upos::Propn => "PROPN",
            Upos::Punct => "PUNCT",
            Upos::Sconj => "SCONJ",
            Upos::Sym => "SYM",
            Upos::Verb => "VERB",
            Upos::X => "X",
        }
    }
}

impl fmt::Display for Upos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown UPOS tag: {0}")]
pub struct UnknownUpos(pub String);

impl FromStr for Upos {
    type Err = UnknownUpos;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Upos::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| UnknownUpos(s.to_string()))
    }
}

/// Token ID from the first CoNLL-U column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenId {
    /// Syntactic word: 1, 2, 3
    Single(usize),
    /// Multiword token: 1-2
    Range(usize, usize),
    /// Empty node: 2.1
    Decimal(usize, usize),
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenId::Single(id) => write!(f, "{}", id),
            TokenId::Range(start, end) => write!(f, "{}-{}", start, end),
            TokenId::Decimal(main, sub) => write!(f, "{}.{}", main, sub),
        }
    }
}

/// Key/value column (FEATS or MISC)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Features(FxHashMap<String, String>);

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: String) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

pub type Misc = Features;

/// Enhanced dependency (DEPS column entry)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dep {
    /// 1-based head, 0 for the root
    pub head: usize,
    pub deprel: String,
}

/// One CoNLL-U token line
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub id: TokenId,
    pub form: String,
    pub lemma: Option<String>,
    pub upos: Option<Upos>,
    pub xpos: Option<String>,
    pub feats: Features,
    /// 1-based head as in CoNLL-U; `Some(0)` marks the root
    pub head: Option<usize>,
    pub deprel: Option<String>,
    pub deps: Vec<Dep>,
    pub misc: Misc,
}

impl Token {
    /// Create a syntactic word with the fields the matchers look at
    pub fn new(id: usize, form: &str, upos: Upos, head: usize, deprel: &str) -> Self {
        Self {
            id: TokenId::Single(id),
            form: form.to_string(),
            lemma: None,
            upos: Some(upos),
            xpos: None,
            feats: Features::new(),
            head: Some(head),
            deprel: Some(deprel.to_string()),
            deps: Vec::new(),
            misc: Misc::new(),
        }
    }

    #[inline]
    pub fn has_upos(&self, upos: Upos) -> bool {
        self.upos == Some(upos)
    }

    #[inline]
    pub fn has_deprel(&self, deprel: &str) -> bool {
        self.deprel.as_deref() == Some(deprel)
    }

    /// Multiword tokens and empty nodes are not part of the basic tree
    pub fn is_word(&self) -> bool {
        matches!(self.id, TokenId::Single(_))
    }
}

/// A sentence: token lines in file order plus comment metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sentence {
    pub tokens: Vec<Token>,
    pub text: Option<String>,
    pub metadata: FxHashMap<String, String>,
}

impl Sentence {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            ..Self::default()
        }
    }

    pub fn with_text(tokens: Vec<Token>, text: &str) -> Self {
        Self {
            tokens,
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn sent_id(&self) -> Option<&str> {
        self.metadata.get("sent_id").map(String::as_str)
    }

    /// Build the basic dependency tree over the sentence's syntactic words
    ///
    /// Children are attached in sentence order. Multiword tokens and empty
    /// nodes are left out.
    pub fn to_tree(&self) -> Result<DepTree<'_>, TreeError> {
        let words: Vec<&Token> = self.tokens.iter().filter(|t| t.is_word()).collect();
        if words.is_empty() {
            return Err(TreeError::Empty);
        }

        // CoNLL-U word id -> position in `words`
        let mut position = FxHashMap::default();
        for (i, word) in words.iter().enumerate() {
            if let TokenId::Single(id) = word.id {
                position.insert(id, i);
            }
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); words.len()];
        let mut root: Option<usize> = None;
        for (i, word) in words.iter().enumerate() {
            match word.head {
                None => return Err(TreeError::MissingHead(word.id)),
                Some(0) => {
                    if let Some(first) = root {
                        return Err(TreeError::MultipleRoots(words[first].id, word.id));
                    }
                    root = Some(i);
                }
                Some(head) => {
                    let parent = *position.get(&head).ok_or(TreeError::InvalidHead {
                        token: word.id,
                        head,
                    })?;
                    children[parent].push(i);
                }
            }
        }
        let root = root.ok_or(TreeError::NoRoot)?;

        let tree = build_subtree(&words, &children, root);
        let reached = tree.len();
        if reached != words.len() {
            return Err(TreeError::Unreachable {
                words: words.len(),
                reached,
            });
        }
        Ok(tree)
    }
}

impl<'a> IntoIterator for &'a Sentence {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

fn build_subtree<'s>(words: &[&'s Token], children: &[Vec<usize>], node: usize) -> DepTree<'s> {
    DepTree {
        token: words[node],
        children: children[node]
            .iter()
            .map(|&child| build_subtree(words, children, child))
            .collect(),
    }
}

/// Error converting a sentence to a tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("sentence has no syntactic words")]
    Empty,
    #[error("token {0} has no head")]
    MissingHead(TokenId),
    #[error("token {token} has head {head}, which is not a word in the sentence")]
    InvalidHead { token: TokenId, head: usize },
    #[error("tokens {0} and {1} are both attached to the root")]
    MultipleRoots(TokenId, TokenId),
    #[error("sentence has no root")]
    NoRoot,
    #[error("only {reached} of {words} words are reachable from the root")]
    Unreachable { words: usize, reached: usize },
}

/// A dependency (sub)tree: one head token and its dependents
#[derive(Debug, Clone, PartialEq)]
pub struct DepTree<'s> {
    pub token: &'s Token,
    pub children: Vec<DepTree<'s>>,
}

impl<'s> DepTree<'s> {
    pub fn new(token: &'s Token, children: Vec<DepTree<'s>>) -> Self {
        Self { token, children }
    }

    pub fn leaf(token: &'s Token) -> Self {
        Self::new(token, Vec::new())
    }

    /// Number of nodes in this subtree
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(DepTree::len).sum::<usize>()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DepTree<'s>> {
        self.children.iter()
    }
}

impl<'t, 's> IntoIterator for &'t DepTree<'s> {
    type Item = &'t DepTree<'s>;
    type IntoIter = std::slice::Iter<'t, DepTree<'s>>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}
