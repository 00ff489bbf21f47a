use scraper::{ElementRef, Html, Node};

use crate::embed::registry::{PathRegistry, TokenMap};
use crate::embed::token::{Token, TokenPattern};
use crate::path::resolve::{element_path, find_root, parse_selector};
use crate::path::structural_path::StructuralPath;
use crate::pipeline::config::MapperConfig;
use crate::pipeline::error::MapperError;

/// Where each token surfaced in a rendered document.
#[derive(Debug, Clone, Default)]
pub struct TokenLocations {
    /// Tokens found in text, at their deepest owning element
    pub text: TokenMap<StructuralPath>,
    /// Tokens found in an image `src`, first occurrence
    pub image: TokenMap<StructuralPath>,
}

impl TokenLocations {
    /// Image hits take precedence over text echoes of the same token.
    pub fn get(&self, token: &Token) -> Option<&StructuralPath> {
        self.image.get(token).or_else(|| self.text.get(token))
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.image.is_empty()
    }

    fn record_text(&mut self, token: Token, path: StructuralPath) {
        // A decorator that copies content leaves shallower echoes behind;
        // the deepest copy is the real one.
        let deeper = self
            .text
            .get(&token)
            .is_none_or(|existing| path.len() > existing.len());
        if deeper {
            self.text.insert(token, path);
        }
    }

    fn record_image(&mut self, token: Token, path: StructuralPath) {
        if !self.image.contains(&token) {
            self.image.insert(token, path);
        }
    }
}

/// Single depth-first pass over the rendered root collecting token positions.
pub fn scan_tokens(rendered: &Html, config: &MapperConfig) -> Result<TokenLocations, MapperError> {
    let root_selector = parse_selector(&config.root_selector)?;
    let pattern = TokenPattern::new(config)?;
    let mut locations = TokenLocations::default();

    let Some(root) = find_root(rendered, &root_selector) else {
        tracing::warn!(
            selector = %config.root_selector,
            "root element not found in rendered document, no page paths recorded"
        );
        return Ok(locations);
    };

    for node in root.descendants() {
        match node.value() {
            Node::Text(text) => {
                let Some(owner) = node.parent().and_then(ElementRef::wrap) else {
                    continue;
                };
                let mut found = pattern.find_all(text).peekable();
                if found.peek().is_none() {
                    continue;
                }
                let Ok(path) = element_path(root, owner) else {
                    continue;
                };
                for raw in found {
                    locations.record_text(Token::from(raw), path.clone());
                }
            }
            Node::Element(element) if element.name() == "img" => {
                let Some(src) = element.attr("src") else {
                    continue;
                };
                let Some(image) = ElementRef::wrap(node) else {
                    continue;
                };
                let Ok(path) = element_path(root, image) else {
                    continue;
                };
                for raw in pattern.find_all(src) {
                    locations.record_image(Token::from(raw), path.clone());
                }
            }
            _ => {}
        }
    }

    Ok(locations)
}

/// Page-path registry for the tokens of `source_paths` that survived rendering.
///
/// Tokens without a rendered counterpart are dropped: their element was
/// removed by a decorator.
pub fn map_page_paths(
    rendered: &Html,
    source_paths: &PathRegistry,
    config: &MapperConfig,
) -> Result<PathRegistry, MapperError> {
    let locations = scan_tokens(rendered, config)?;
    let mut page_paths = PathRegistry::new();

    for token in source_paths.tokens() {
        if let Some(path) = locations.get(token) {
            page_paths.insert(token.clone(), path.clone());
        }
    }

    let dropped = source_paths.len() - page_paths.len();
    if dropped > 0 {
        tracing::debug!(dropped, "tokens without a rendered counterpart");
    }

    Ok(page_paths)
}
