use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::embed::token::{Token, TokenKind};
use crate::path::structural_path::StructuralPath;

/// Insertion-ordered token map.
///
/// Built once by a pipeline phase and read-only afterwards. Iteration
/// follows document order of the phase that filled it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TokenEntry<V>>", into = "Vec<TokenEntry<V>>")]
#[serde(bound(serialize = "V: Serialize + Clone", deserialize = "V: Deserialize<'de>"))]
pub struct TokenMap<V> {
    entries: Vec<TokenEntry<V>>,
    index: HashMap<Token, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenEntry<V> {
    pub token: Token,
    pub value: V,
}

/// token -> structural path (source or rendered page)
pub type PathRegistry = TokenMap<StructuralPath>;

/// token -> what the token replaced
pub type TokenTable = TokenMap<TokenRecord>;

impl<V> Default for TokenMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> TokenMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced entry keeps its original position.
    pub fn insert(&mut self, token: Token, value: V) {
        match self.index.get(&token) {
            Some(&slot) => self.entries[slot].value = value,
            None => {
                self.index.insert(token.clone(), self.entries.len());
                self.entries.push(TokenEntry { token, value });
            }
        }
    }

    pub fn get(&self, token: &Token) -> Option<&V> {
        self.index.get(token).map(|&slot| &self.entries[slot].value)
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.index.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Token, &V)> {
        self.entries.iter().map(|e| (&e.token, &e.value))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.entries.iter().map(|e| &e.token)
    }
}

impl<V> From<Vec<TokenEntry<V>>> for TokenMap<V> {
    fn from(entries: Vec<TokenEntry<V>>) -> Self {
        let mut map = TokenMap::new();
        for entry in entries {
            map.insert(entry.token, entry.value);
        }
        map
    }
}

impl<V> From<TokenMap<V>> for Vec<TokenEntry<V>> {
    fn from(map: TokenMap<V>) -> Self {
        map.entries
    }
}

impl PathRegistry {
    /// Every token here is also present in `other`.
    pub fn is_subset_of(&self, other: &PathRegistry) -> bool {
        self.tokens().all(|token| other.contains(token))
    }
}

/// What an embedding pass replaced with a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub kind: TokenKind,
    /// Original inner markup (HTML kind) or attribute value (SRC kind)
    pub original: String,
    /// Uppercased tag of the element carrying the token
    pub tag: String,
}
