use scraper::{ElementRef, Html, Selector};

use crate::path::structural_path::{PathStep, StructuralPath};
use crate::pipeline::error::{MapperError, PathError};

// ============================================================================
// Selectors and roots
// ============================================================================

pub fn parse_selector(selector: &str) -> Result<Selector, MapperError> {
    Selector::parse(selector).map_err(|e| MapperError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// First element of `document` matching `selector`, in document order.
///
/// Searches from the document node down, so nodes detached from the tree
/// never match. An empty document has no root.
pub fn find_root<'a>(document: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
    document
        .tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|candidate| selector.matches(candidate))
}

/// Same as [`find_root`], but starting from any element of the document.
pub fn find_root_in_tree<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    element
        .tree()
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|candidate| selector.matches(candidate))
}

// ============================================================================
// Element -> path
// ============================================================================

/// Uppercased local name, the tag form used in paths and tokens.
pub fn tag_name(element: ElementRef<'_>) -> String {
    element.value().name().to_ascii_uppercase()
}

/// Element children only; text and comments never count toward an index.
pub fn element_children<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

/// Structural path of `element` relative to `root`.
///
/// Fails when `element` is not `root` itself or one of its descendants.
pub fn element_path(root: ElementRef<'_>, element: ElementRef<'_>) -> Result<StructuralPath, PathError> {
    let mut steps = Vec::new();
    let mut current = element;

    while current != root {
        let not_descendant = || PathError::NotDescendant {
            tag: tag_name(element),
        };

        let parent = current
            .parent()
            .and_then(ElementRef::wrap)
            .ok_or_else(not_descendant)?;

        let index = element_children(parent)
            .position(|child| child == current)
            .ok_or_else(not_descendant)?;

        steps.push(PathStep::new(current.value().name(), index));
        current = parent;
    }

    steps.reverse();
    Ok(StructuralPath::new(steps))
}

// ============================================================================
// Path -> element
// ============================================================================

/// Walk `path` down from `root`, checking the tag at every step.
///
/// Any missing child or tag mismatch yields `None`, never a different node.
pub fn resolve_path<'a>(root: ElementRef<'a>, path: &StructuralPath) -> Option<ElementRef<'a>> {
    let mut current = root;
    for step in path.steps() {
        let child = element_children(current).nth(step.index)?;
        if tag_name(child) != step.tag {
            return None;
        }
        current = child;
    }
    Some(current)
}
