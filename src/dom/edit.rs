use ego_tree::{NodeId, NodeRef};
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, Selector};

// ============================================================================
// Owned subtrees
// ============================================================================

/// Detached copy of a node and its descendants, ready to graft anywhere.
#[derive(Debug, Clone)]
pub struct Subtree {
    value: Node,
    children: Vec<Subtree>,
}

impl Subtree {
    pub fn snapshot(node: NodeRef<'_, Node>) -> Self {
        Self {
            value: node.value().clone(),
            children: node.children().map(Subtree::snapshot).collect(),
        }
    }

    /// Top-level nodes of a parsed HTML fragment.
    pub fn parse_fragment(markup: &str) -> Vec<Self> {
        let fragment = Html::parse_fragment(markup);
        fragment
            .root_element()
            .children()
            .map(Subtree::snapshot)
            .collect()
    }

    fn graft(self, html: &mut Html, parent: NodeId) -> Option<NodeId> {
        let id = html.tree.get_mut(parent)?.append(self.value).id();
        for child in self.children {
            child.graft(html, id);
        }
        Some(id)
    }

    fn graft_before(self, html: &mut Html, sibling: NodeId) -> Option<NodeId> {
        let id = html.tree.get_mut(sibling)?.insert_before(self.value).id();
        for child in self.children {
            child.graft(html, id);
        }
        Some(id)
    }

    fn graft_after(self, html: &mut Html, sibling: NodeId) -> Option<NodeId> {
        let id = html.tree.get_mut(sibling)?.insert_after(self.value).id();
        for child in self.children {
            child.graft(html, id);
        }
        Some(id)
    }
}

// ============================================================================
// Queries
// ============================================================================

pub fn element(html: &Html, id: NodeId) -> Option<ElementRef<'_>> {
    html.tree.get(id).and_then(ElementRef::wrap)
}

/// Ids of the elements under `scope` matching `selector`, in document order.
pub fn select_ids(html: &Html, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
    element(html, scope)
        .map(|scope| scope.select(selector).map(|el| el.id()).collect())
        .unwrap_or_default()
}

// ============================================================================
// Mutations
// ============================================================================

/// Detach every child of `id`.
pub fn clear_children(html: &mut Html, id: NodeId) {
    let children: Vec<NodeId> = match html.tree.get(id) {
        Some(node) => node.children().map(|c| c.id()).collect(),
        None => return,
    };
    for child in children {
        if let Some(mut node) = html.tree.get_mut(child) {
            node.detach();
        }
    }
}

/// Replace the whole content of `id` with a single text node.
pub fn replace_with_text(html: &mut Html, id: NodeId, text: &str) -> bool {
    if html.tree.get(id).is_none() {
        return false;
    }
    clear_children(html, id);
    html.tree
        .get_mut(id)
        .map(|mut node| {
            node.append(Node::Text(Text { text: text.into() }));
        })
        .is_some()
}

/// Set (or add) an attribute on an element.
///
/// The element value is rebuilt rather than patched: scraper caches the id
/// and class list on first use, and a patched element would keep matching
/// its old selectors.
pub fn set_attribute(html: &mut Html, id: NodeId, name: &str, value: &str) -> bool {
    let Some(current) = element(html, id) else {
        return false;
    };
    let tag = current.value().name.clone();

    let mut attrs: Vec<(String, String)> = current
        .value()
        .attrs()
        .filter(|(attr, _)| !attr.eq_ignore_ascii_case(name))
        .map(|(attr, existing)| (attr.to_string(), existing.to_string()))
        .collect();
    attrs.push((name.to_ascii_lowercase(), value.to_string()));

    // A name the parser cannot take as one attribute yields a different count.
    let Some(mut rebuilt) = element_template(&attrs) else {
        return false;
    };
    if rebuilt.attrs.len() != attrs.len() {
        return false;
    }
    rebuilt.name = tag;

    match html.tree.get_mut(id) {
        Some(mut node) => {
            *node.value() = Node::Element(rebuilt);
            true
        }
        None => false,
    }
}

/// Fresh `<span>` element carrying exactly `attrs`.
fn element_template(attrs: &[(String, String)]) -> Option<Element> {
    let rendered: String = attrs
        .iter()
        .map(|(name, value)| format!(" {}=\"{}\"", name, escape_attribute(value)))
        .collect();
    let template = Html::parse_fragment(&format!("<span{}></span>", rendered));
    template
        .root_element()
        .descendants()
        .find_map(|node| match node.value() {
            Node::Element(el) if el.name() == "span" => Some(el.clone()),
            _ => None,
        })
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Append parsed `markup` as the last children of `parent`.
pub fn append_markup(html: &mut Html, parent: NodeId, markup: &str) -> Vec<NodeId> {
    Subtree::parse_fragment(markup)
        .into_iter()
        .filter_map(|subtree| subtree.graft(html, parent))
        .collect()
}

/// Insert parsed `markup` right before `sibling`.
pub fn insert_markup_before(html: &mut Html, sibling: NodeId, markup: &str) -> Vec<NodeId> {
    Subtree::parse_fragment(markup)
        .into_iter()
        .filter_map(|subtree| subtree.graft_before(html, sibling))
        .collect()
}

/// Move `id` into a new element built from the first element of
/// `wrapper_markup`. Returns the wrapper id.
pub fn wrap_element(html: &mut Html, id: NodeId, wrapper_markup: &str) -> Option<NodeId> {
    let wrapper = Subtree::parse_fragment(wrapper_markup)
        .into_iter()
        .find(|subtree| matches!(subtree.value, Node::Element(_)))?;

    if html.tree.get(id).is_none() {
        return None;
    }
    let wrapper_id = Subtree {
        value: wrapper.value,
        children: Vec::new(),
    }
    .graft_before(html, id)?;

    html.tree.get_mut(wrapper_id)?.append_id(id);
    Some(wrapper_id)
}

/// Copy `id` with its descendants and insert the copy right after it.
pub fn duplicate_after(html: &mut Html, id: NodeId) -> Option<NodeId> {
    let copy = Subtree::snapshot(html.tree.get(id)?);
    copy.graft_after(html, id)
}

/// Detach `id` from the document.
pub fn remove_element(html: &mut Html, id: NodeId) -> bool {
    match html.tree.get_mut(id) {
        Some(mut node) => {
            node.detach();
            true
        }
        None => false,
    }
}
