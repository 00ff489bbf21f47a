use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};

use crate::embed::registry::{PathRegistry, TokenTable};
use crate::embed::token::Token;
use crate::path::resolve::{element_path, find_root, find_root_in_tree, parse_selector, resolve_path};
use crate::path::structural_path::StructuralPath;
use crate::pipeline::config::MapperConfig;
use crate::pipeline::error::MapperError;

/// One side of a mapped pair.
#[derive(Debug, Clone)]
pub struct MappedSide<'a> {
    pub element: ElementRef<'a>,
    pub path: StructuralPath,
}

/// A tracked element resolved in both the source and a rendered page.
#[derive(Debug, Clone)]
pub struct MappedPair<'s, 'p> {
    pub token: Token,
    pub source: MappedSide<'s>,
    pub page: MappedSide<'p>,
}

/// Answers "which source element produced this rendered element?".
///
/// All lookup structures are built once in [`MapperService::new`] and never
/// change afterwards. The source document itself stays editable through
/// [`MapperService::source_doc_mut`]; structural edits there make affected
/// lookups miss instead of returning the wrong node.
pub struct MapperService {
    source_doc: Html,
    tokens: TokenTable,
    source_paths: PathRegistry,
    page_paths: PathRegistry,
    /// serialized page path -> token
    page_index: HashMap<String, Token>,
    root_selector: Selector,
    config: MapperConfig,
}

impl MapperService {
    pub fn new(
        source_doc: Html,
        tokens: TokenTable,
        source_paths: PathRegistry,
        page_paths: PathRegistry,
        config: MapperConfig,
    ) -> Result<Self, MapperError> {
        let root_selector = parse_selector(&config.root_selector)?;

        if !page_paths.is_subset_of(&source_paths) {
            return Err(MapperError::Configuration(
                "page-path registry holds tokens unknown to the source-path registry".into(),
            ));
        }

        let mut page_index = HashMap::with_capacity(page_paths.len());
        for (token, path) in page_paths.iter() {
            let key = path.key();
            if let Some(existing) = page_index.get(&key) {
                tracing::debug!(
                    %key,
                    kept = %existing,
                    ignored = %token,
                    "two tokens share one rendered element"
                );
                continue;
            }
            page_index.insert(key, token.clone());
        }

        Ok(Self {
            source_doc,
            tokens,
            source_paths,
            page_paths,
            page_index,
            root_selector,
            config,
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Source element for a rendered element, or `None` when the element
    /// was not tracked or the source no longer has the recorded shape.
    pub fn find_source_element(&self, page_element: ElementRef<'_>) -> Option<ElementRef<'_>> {
        let token = self.token_for_page_element(page_element)?;
        self.source_element_for_token(token)
    }

    /// Token whose rendered position is `page_element`.
    pub fn token_for_page_element(&self, page_element: ElementRef<'_>) -> Option<&Token> {
        let page_root = find_root_in_tree(page_element, &self.root_selector)?;
        let path = element_path(page_root, page_element).ok()?;
        self.page_index.get(&path.key())
    }

    /// Walk the source document along the token's recorded path.
    pub fn source_element_for_token(&self, token: &Token) -> Option<ElementRef<'_>> {
        let path = self.source_paths.get(token)?;
        resolve_path(self.source_root()?, path)
    }

    /// Every tracked element that resolves in both the source and `page`.
    pub fn all_mapped_elements<'s, 'p>(&'s self, page: &'p Html) -> Vec<MappedPair<'s, 'p>> {
        let Some(source_root) = self.source_root() else {
            return Vec::new();
        };
        let page_root = find_root(page, &self.root_selector);

        self.source_paths
            .iter()
            .filter_map(|(token, source_path)| {
                let page_path = self.page_paths.get(token)?;
                let source = resolve_path(source_root, source_path)?;
                let page = resolve_path(page_root?, page_path)?;
                Some(MappedPair {
                    token: token.clone(),
                    source: MappedSide {
                        element: source,
                        path: source_path.clone(),
                    },
                    page: MappedSide {
                        element: page,
                        path: page_path.clone(),
                    },
                })
            })
            .collect()
    }

    pub fn source_root(&self) -> Option<ElementRef<'_>> {
        find_root(&self.source_doc, &self.root_selector)
    }

    // ------------------------------------------------------------------
    // Source document
    // ------------------------------------------------------------------

    /// The live source document, never a copy.
    pub fn source_doc(&self) -> &Html {
        &self.source_doc
    }

    /// Edit the source document in place.
    pub fn source_doc_mut(&mut self) -> &mut Html {
        &mut self.source_doc
    }

    pub fn source_markup(&self) -> String {
        self.source_doc.html()
    }

    // ------------------------------------------------------------------
    // Registries
    // ------------------------------------------------------------------

    pub fn tokens(&self) -> &TokenTable {
        &self.tokens
    }

    pub fn source_paths(&self) -> &PathRegistry {
        &self.source_paths
    }

    pub fn page_paths(&self) -> &PathRegistry {
        &self.page_paths
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }
}

impl std::fmt::Debug for MapperService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperService")
            .field("tokens", &self.tokens.len())
            .field("source_paths", &self.source_paths.len())
            .field("page_paths", &self.page_paths.len())
            .field("root_selector", &self.config.root_selector)
            .finish()
    }
}
