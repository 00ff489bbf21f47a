use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use crate::dom::edit::{replace_with_text, set_attribute};
use crate::embed::registry::{PathRegistry, TokenRecord, TokenTable};
use crate::embed::token::{TokenGenerator, TokenKind};
use crate::path::resolve::{element_children, element_path, find_root, parse_selector, tag_name};
use crate::path::structural_path::StructuralPath;
use crate::pipeline::config::MapperConfig;
use crate::pipeline::error::MapperError;

/// Attribute listing the token ids an instrumented element carries.
pub const TOKEN_IDS_ATTRIBUTE: &str = "data-source-map-tokens";

/// Result of one embedding pass.
#[derive(Debug, Clone)]
pub struct EmbedOutput {
    /// Serialized token-bearing document
    pub marked_html: String,
    pub tokens: TokenTable,
    pub source_paths: PathRegistry,
}

impl EmbedOutput {
    fn unchanged(markup: &str) -> Self {
        Self {
            marked_html: markup.to_string(),
            tokens: TokenTable::new(),
            source_paths: PathRegistry::new(),
        }
    }
}

/// One planned replacement, computed before the tree is touched.
struct Mark {
    /// Element that receives the token
    target: NodeId,
    /// Leaf element the diagnostic attribute goes on
    leaf: NodeId,
    tag: String,
    path: StructuralPath,
    kind: TokenKind,
    original: String,
}

/// Replace the content of every leaf target under the root with tokens.
///
/// A missing root is not an error: the input comes back unchanged with
/// empty registries.
pub fn embed_markers(markup: &str, config: &MapperConfig) -> Result<EmbedOutput, MapperError> {
    let root_selector = parse_selector(&config.root_selector)?;
    let targets = config
        .target_selectors
        .iter()
        .map(|s| parse_selector(s))
        .collect::<Result<Vec<_>, _>>()?;

    let mut document = Html::parse_document(markup);

    let marks = {
        let Some(root) = find_root(&document, &root_selector) else {
            tracing::warn!(
                selector = %config.root_selector,
                "root element not found, embedding skipped"
            );
            return Ok(EmbedOutput::unchanged(markup));
        };
        plan_marks(root, &targets)
    };

    let mut generator = TokenGenerator::new(config);
    let mut tokens = TokenTable::new();
    let mut source_paths = PathRegistry::new();
    let mut carried: Vec<(NodeId, Vec<String>)> = Vec::new();

    for mark in marks {
        let token = generator.next(&mark.tag, mark.kind)?;

        match mark.kind {
            TokenKind::Src => {
                set_attribute(&mut document, mark.target, "src", token.as_str());
            }
            TokenKind::Html => {
                replace_with_text(&mut document, mark.target, token.as_str());
            }
        }

        if let Some((_, id, _)) = token.parts(&config.token_prefix) {
            match carried.iter_mut().find(|(leaf, _)| *leaf == mark.leaf) {
                Some((_, ids)) => ids.push(id.to_string()),
                None => carried.push((mark.leaf, vec![id.to_string()])),
            }
        }

        source_paths.insert(token.clone(), mark.path);
        tokens.insert(
            token,
            TokenRecord {
                kind: mark.kind,
                original: mark.original,
                tag: mark.tag,
            },
        );
    }

    for (leaf, ids) in carried {
        set_attribute(&mut document, leaf, TOKEN_IDS_ATTRIBUTE, &ids.join(" "));
    }

    tracing::debug!(tokens = tokens.len(), "markers embedded");

    Ok(EmbedOutput {
        marked_html: document.html(),
        tokens,
        source_paths,
    })
}

/// Leaf targets under `root`, in document order.
///
/// A target containing another target is a container, not a leaf.
pub fn leaf_targets<'a>(root: ElementRef<'a>, targets: &[Selector]) -> Vec<ElementRef<'a>> {
    let candidates: Vec<ElementRef<'a>> = root
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|el| targets.iter().any(|selector| selector.matches(el)))
        .collect();

    let mut containers: HashSet<NodeId> = HashSet::new();
    for candidate in &candidates {
        for ancestor in candidate.ancestors() {
            if ancestor.id() == root.id() {
                break;
            }
            containers.insert(ancestor.id());
        }
    }

    candidates
        .into_iter()
        .filter(|el| !containers.contains(&el.id()))
        .collect()
}

fn plan_marks(root: ElementRef<'_>, targets: &[Selector]) -> Vec<Mark> {
    let mut marks = Vec::new();

    for leaf in leaf_targets(root, targets) {
        // Leaves come from root's own subtree, so the path always resolves.
        let Ok(path) = element_path(root, leaf) else {
            continue;
        };

        match leaf.value().name() {
            "img" => match leaf.value().attr("src") {
                Some(src) => marks.push(Mark {
                    target: leaf.id(),
                    leaf: leaf.id(),
                    tag: tag_name(leaf),
                    path,
                    kind: TokenKind::Src,
                    original: src.to_string(),
                }),
                None => tracing::debug!(path = %path, "image without src skipped"),
            },
            "ul" | "ol" => {
                for item in element_children(leaf).filter(|c| c.value().name() == "li") {
                    let inner = item.inner_html();
                    if inner.trim().is_empty() {
                        continue;
                    }
                    let Ok(item_path) = element_path(root, item) else {
                        continue;
                    };
                    marks.push(Mark {
                        target: item.id(),
                        leaf: leaf.id(),
                        tag: tag_name(item),
                        path: item_path,
                        kind: TokenKind::Html,
                        original: inner,
                    });
                }
            }
            _ => marks.push(Mark {
                target: leaf.id(),
                leaf: leaf.id(),
                tag: tag_name(leaf),
                path,
                kind: TokenKind::Html,
                original: leaf.inner_html(),
            }),
        }
    }

    marks
}
