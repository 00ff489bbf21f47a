use ego_tree::NodeId;
use scraper::{ElementRef, Html};

use crate::dom::edit;
use crate::pipeline::error::MapperError;
use crate::service::mapper_service::{MappedPair, MapperService};

/// One editing surface: the mapper, the rendered page it serves, and the
/// source element currently being edited.
///
/// Whoever manages the surface owns the session and passes it around
/// explicitly; there is no process-wide "active editor".
pub struct EditSession {
    service: MapperService,
    page: Html,
    active: Option<NodeId>,
}

impl EditSession {
    pub fn new(service: MapperService, page: Html) -> Self {
        Self {
            service,
            page,
            active: None,
        }
    }

    pub fn service(&self) -> &MapperService {
        &self.service
    }

    pub fn page(&self) -> &Html {
        &self.page
    }

    /// Make the source element behind a page element the active one.
    ///
    /// Leaves the session inactive when the page element is not tracked.
    pub fn activate(&mut self, page_element: NodeId) -> Option<ElementRef<'_>> {
        self.active = edit::element(&self.page, page_element)
            .and_then(|el| self.service.find_source_element(el))
            .map(|source| source.id());
        self.active_source()
    }

    pub fn active_source(&self) -> Option<ElementRef<'_>> {
        edit::element(self.service.source_doc(), self.active?)
    }

    pub fn deactivate(&mut self) {
        self.active = None;
    }

    /// Replace the active source element's content with plain text.
    pub fn replace_text(&mut self, text: &str) -> Result<(), MapperError> {
        let active = self.active.ok_or(MapperError::NoActiveElement)?;
        if !edit::replace_with_text(self.service.source_doc_mut(), active, text) {
            self.active = None;
            return Err(MapperError::NoActiveElement);
        }
        Ok(())
    }

    /// Mapped pairs against the session's own page.
    pub fn mapped_elements(&self) -> Vec<MappedPair<'_, '_>> {
        self.service.all_mapped_elements(&self.page)
    }

    pub fn into_service(self) -> MapperService {
        self.service
    }
}
