use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pipeline::config::MapperConfig;
use crate::pipeline::error::MapperError;

// ============================================================================
// Token model
// ============================================================================

/// What a token stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// The element's inner markup
    #[serde(rename = "HTML")]
    Html,
    /// An image's `src` attribute value
    #[serde(rename = "SRC")]
    Src,
}

impl TokenKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            TokenKind::Html => "HTML",
            TokenKind::Src => "SRC",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "HTML" => Some(TokenKind::Html),
            "SRC" => Some(TokenKind::Src),
            _ => None,
        }
    }
}

/// Opaque tracking string `{prefix}{TAG}_{id}_{KIND}`.
///
/// The format is wire contract: external scanners match it byte for byte.
/// TAG is the uppercased tag name with any character outside
/// `[A-Z0-9._-]` written as `-`, so custom element names stay scannable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn format(prefix: &str, tag: &str, id: &str, kind: TokenKind) -> Self {
        Token(format!(
            "{}{}_{}_{}",
            prefix,
            token_tag(tag),
            id,
            kind.suffix()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into (tag, id, kind) given the prefix it was built with.
    pub fn parts(&self, prefix: &str) -> Option<(&str, &str, TokenKind)> {
        let body = self.0.strip_prefix(prefix)?;
        let (rest, suffix) = body.rsplit_once('_')?;
        let (tag, id) = rest.rsplit_once('_')?;
        if tag.is_empty() || id.is_empty() {
            return None;
        }
        Some((tag, id, TokenKind::from_suffix(suffix)?))
    }
}

fn token_tag(tag: &str) -> String {
    tag.chars()
        .map(|c| match c.to_ascii_uppercase() {
            upper @ ('A'..='Z' | '0'..='9' | '.' | '_' | '-') => upper,
            _ => '-',
        })
        .collect()
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(raw: &str) -> Self {
        Token(raw.to_string())
    }
}

// ============================================================================
// Generation
// ============================================================================

/// Random draws before falling back to a sequential scan of the id space.
const RANDOM_DRAWS: usize = 64;

const ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Random token ids; every issued token is unique within one embedding pass.
pub struct TokenGenerator {
    prefix: String,
    id_length: usize,
    issued: HashSet<Token>,
}

impl TokenGenerator {
    pub fn new(config: &MapperConfig) -> Self {
        Self {
            prefix: config.token_prefix.clone(),
            id_length: config.token_id_length,
            issued: HashSet::new(),
        }
    }

    /// Issue a fresh token.
    ///
    /// Ids are drawn at random; once draws keep colliding the id space is
    /// walked in order, and an exhausted space is a configuration error.
    pub fn next(&mut self, tag: &str, kind: TokenKind) -> Result<Token, MapperError> {
        let mut rng = rand::thread_rng();
        for _ in 0..RANDOM_DRAWS {
            let id: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(self.id_length)
                .map(char::from)
                .collect();
            if let Some(token) = self.claim(tag, &id, kind) {
                return Ok(token);
            }
        }

        let space = (ID_ALPHABET.len() as u64)
            .checked_pow(self.id_length as u32)
            .unwrap_or(u64::MAX);
        for ordinal in 0..space {
            if let Some(token) = self.claim(tag, &sequential_id(ordinal, self.id_length), kind) {
                return Ok(token);
            }
        }

        Err(MapperError::Configuration(format!(
            "token ids of length {} exhausted for {} {} tokens; raise token_id_length",
            self.id_length,
            tag.to_ascii_uppercase(),
            kind.suffix()
        )))
    }

    fn claim(&mut self, tag: &str, id: &str, kind: TokenKind) -> Option<Token> {
        let token = Token::format(&self.prefix, tag, id, kind);
        self.issued.insert(token.clone()).then_some(token)
    }

    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}

/// `ordinal` written in the id alphabet, left-padded to `length`.
fn sequential_id(mut ordinal: u64, length: usize) -> String {
    let base = ID_ALPHABET.len() as u64;
    let mut digits = vec![ID_ALPHABET[0]; length];
    for slot in digits.iter_mut().rev() {
        *slot = ID_ALPHABET[(ordinal % base) as usize];
        ordinal /= base;
    }
    String::from_utf8_lossy(&digits).into_owned()
}

// ============================================================================
// Scanning
// ============================================================================

/// Compiled matcher for the token grammar of one configuration.
#[derive(Debug, Clone)]
pub struct TokenPattern {
    regex: Regex,
}

impl TokenPattern {
    pub fn new(config: &MapperConfig) -> Result<Self, MapperError> {
        let pattern = format!(
            r"{}[A-Z][A-Z0-9._-]*_[A-Za-z0-9]{{{}}}_(?:HTML|SRC)",
            regex::escape(&config.token_prefix),
            config.token_id_length
        );
        let regex = Regex::new(&pattern)
            .map_err(|e| MapperError::Configuration(format!("token pattern: {}", e)))?;
        Ok(Self { regex })
    }

    /// Every token occurring in `text`, left to right.
    pub fn find_all<'t>(&self, text: &'t str) -> impl Iterator<Item = &'t str> {
        self.regex.find_iter(text).map(|m| m.as_str())
    }

    pub fn is_token(&self, text: &str) -> bool {
        self.regex
            .find(text)
            .is_some_and(|m| m.start() == 0 && m.end() == text.len())
    }
}
