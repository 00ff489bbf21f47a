use std::any::{Any, TypeId};
use std::collections::HashMap;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use crate::dom::edit;
use crate::path::resolve::{find_root, parse_selector};
use crate::pipeline::error::MapperError;

// ============================================================================
// Sandbox global scope
// ============================================================================

/// Typed values decorators look up at run time, one per type.
///
/// Stands in for the global scope of the sandbox document: the context
/// setup callable installs whatever hooks the decorators expect.
#[derive(Default)]
pub struct SandboxGlobals {
    values: HashMap<TypeId, Box<dyn Any>>,
}

impl SandboxGlobals {
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.values
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut::<T>())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

impl std::fmt::Debug for SandboxGlobals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxGlobals")
            .field("values", &self.values.len())
            .finish()
    }
}

// ============================================================================
// Sandbox document
// ============================================================================

/// Disposable, isolated document that decorators run against.
///
/// Each render owns its own sandbox. `teardown` may be called at any point
/// and more than once; dropping the sandbox tears it down as well.
pub struct Sandbox {
    document: Html,
    globals: SandboxGlobals,
    host_styles: Vec<String>,
    torn_down: bool,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            document: Html::new_document(),
            globals: SandboxGlobals::default(),
            host_styles: Vec::new(),
            torn_down: false,
        }
    }

    /// Host page stylesheets, re-applied to the head on every `write`.
    pub fn adopt_styles(&mut self, styles: Vec<String>) {
        self.host_styles = styles;
    }

    pub fn globals(&self) -> &SandboxGlobals {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut SandboxGlobals {
        &mut self.globals
    }

    /// Replace the whole document with `markup`.
    pub fn write(&mut self, markup: &str) {
        self.document = Html::parse_document(markup);
        self.inject_styles();
    }

    fn inject_styles(&mut self) {
        let head = parse_selector("head")
            .ok()
            .and_then(|selector| find_root(&self.document, &selector))
            .map(|head| head.id());

        let Some(head) = head else {
            return;
        };
        for css in &self.host_styles {
            edit::append_markup(
                &mut self.document,
                head,
                &format!("<style data-host-style>{}</style>", css),
            );
        }
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Html {
        &mut self.document
    }

    pub fn root(&self, selector: &Selector) -> Option<NodeId> {
        find_root(&self.document, selector).map(|root| root.id())
    }

    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        edit::element(&self.document, id)
    }

    /// Serialize the entire document, head included.
    pub fn serialize(&self) -> String {
        self.document.html()
    }

    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.document = Html::new_document();
        self.globals.clear();
        self.host_styles.clear();
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // ------------------------------------------------------------------
    // Decorator helpers
    // ------------------------------------------------------------------

    pub fn select(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, MapperError> {
        let selector = parse_selector(selector)?;
        Ok(edit::select_ids(&self.document, scope, &selector))
    }

    pub fn wrap(&mut self, id: NodeId, wrapper_markup: &str) -> Option<NodeId> {
        edit::wrap_element(&mut self.document, id, wrapper_markup)
    }

    pub fn append_markup(&mut self, parent: NodeId, markup: &str) -> Vec<NodeId> {
        edit::append_markup(&mut self.document, parent, markup)
    }

    pub fn insert_markup_before(&mut self, sibling: NodeId, markup: &str) -> Vec<NodeId> {
        edit::insert_markup_before(&mut self.document, sibling, markup)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        edit::set_attribute(&mut self.document, id, name, value)
    }

    pub fn replace_text(&mut self, id: NodeId, text: &str) -> bool {
        edit::replace_with_text(&mut self.document, id, text)
    }

    pub fn duplicate(&mut self, id: NodeId) -> Option<NodeId> {
        edit::duplicate_after(&mut self.document, id)
    }

    pub fn remove(&mut self, id: NodeId) -> bool {
        edit::remove_element(&mut self.document, id)
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        self.teardown();
    }
}
