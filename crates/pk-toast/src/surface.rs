//! Injected handle to the page region that hosts toasts.

use crate::config::ToastConfig;
use pk_core::PageResult;
use pk_dom::Document;
use pk_dom::NodeId;
use pk_dom::SharedDocument;
use std::cell::Cell;

/// Owns the lazily created toast container inside a shared document.
///
/// The composition root builds one surface per page and hands it to the
/// presenter, so the container is never looked up through global state.
#[derive(Debug)]
pub struct ToastSurface {
    document: SharedDocument,
    container_id: String,
    container_class: String,
    container: Cell<Option<NodeId>>,
}

impl ToastSurface {
    pub fn new(document: SharedDocument, config: &ToastConfig) -> Self {
        Self {
            document,
            container_id: config.container_id.clone(),
            container_class: config.container_class.clone(),
            container: Cell::new(None),
        }
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    /// Container node, if one has been created or adopted.
    pub fn container(&self) -> Option<NodeId> {
        self.container.get()
    }

    /// Returns the container, creating and attaching it on first use.
    ///
    /// A connected element carrying the container id always wins, so the page
    /// never holds two containers. Otherwise a detached container is
    /// re-attached rather than duplicated.
    pub fn ensure_container(&self, document: &mut Document) -> PageResult<NodeId> {
        let cached = self.container.get();
        if let Some(existing) = cached.filter(|node| document.is_connected(*node)) {
            return Ok(existing);
        }

        let container = if let Some(adopted) = document.element_by_id(&self.container_id) {
            adopted
        } else if let Some(detached) = cached.filter(|node| document.element(*node).is_some()) {
            let body = document.body();
            document.append_child(body, detached)?;
            detached
        } else {
            let created = document.create_element("div")?;
            document.set_id(created, &self.container_id)?;
            document.add_class(created, &self.container_class)?;
            let body = document.body();
            document.append_child(body, created)?;
            tracing::debug!(container_id = %self.container_id, "created toast container");
            created
        };

        self.container.set(Some(container));
        Ok(container)
    }
}
