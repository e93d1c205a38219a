//! Rendering library boundary.
//!
//! SYSTEM CONTEXT
//! ==============
//! The loader never touches a document directly. Anything that can answer
//! "does this container exist / is it empty" and can replace or clear a
//! container's content can host widgets. `MemoryHost` is the in-process host
//! used for tests, the CLI, and server-side snapshots; `crate::web::DomHost`
//! is the browser host.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::HostError;
use crate::view::{Props, ViewNode, create_view};

pub trait RenderHost {
    fn has_container(&self, container_id: &str) -> bool;

    /// `true` when the container holds no output. Unknown containers are empty.
    fn is_empty(&self, container_id: &str) -> bool;

    /// Replace the container's content with `node`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::ContainerNotFound`] when the container does not
    /// exist, or [`HostError::Rejected`] when the host refuses the view.
    fn mount(&self, container_id: &str, node: ViewNode) -> Result<(), HostError>;

    /// Clear the container. Unknown containers are ignored.
    fn unmount(&self, container_id: &str);

    /// Whether the rendering library itself is available.
    fn is_ready(&self) -> bool {
        true
    }

    fn create_view(&self, tag: &str, props: &Props, children: Vec<ViewNode>) -> ViewNode {
        create_view(tag, props, children)
    }
}

// =============================================================================
// MEMORY HOST
// =============================================================================

/// Host backed by a map of container id to current content.
#[derive(Debug, Default)]
pub struct MemoryHost {
    containers: RefCell<BTreeMap<String, Option<ViewNode>>>,
    rejecting: RefCell<BTreeMap<String, String>>,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_containers<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let host = Self::new();
        for id in ids {
            host.add_container(id);
        }
        host
    }

    /// Add an empty container. Existing content is kept.
    pub fn add_container(&self, id: impl Into<String>) {
        self.containers.borrow_mut().entry(id.into()).or_insert(None);
    }

    pub fn remove_container(&self, id: &str) {
        self.containers.borrow_mut().remove(id);
    }

    /// Make every mount into `id` fail with [`HostError::Rejected`].
    pub fn reject_mounts(&self, id: impl Into<String>, reason: impl Into<String>) {
        self.rejecting.borrow_mut().insert(id.into(), reason.into());
    }

    pub fn accept_mounts(&self, id: &str) {
        self.rejecting.borrow_mut().remove(id);
    }

    #[must_use]
    pub fn content(&self, id: &str) -> Option<ViewNode> {
        self.containers.borrow().get(id).cloned().flatten()
    }

    /// Serialized content, empty string for empty or unknown containers.
    #[must_use]
    pub fn html(&self, id: &str) -> String {
        self.content(id).map(|node| node.to_html()).unwrap_or_default()
    }

    #[must_use]
    pub fn container_ids(&self) -> Vec<String> {
        self.containers.borrow().keys().cloned().collect()
    }
}

impl RenderHost for MemoryHost {
    fn has_container(&self, container_id: &str) -> bool {
        self.containers.borrow().contains_key(container_id)
    }

    fn is_empty(&self, container_id: &str) -> bool {
        self.containers
            .borrow()
            .get(container_id)
            .and_then(Option::as_ref)
            .map_or(true, ViewNode::is_blank)
    }

    fn mount(&self, container_id: &str, node: ViewNode) -> Result<(), HostError> {
        if let Some(reason) = self.rejecting.borrow().get(container_id) {
            return Err(HostError::Rejected { container: container_id.to_owned(), reason: reason.clone() });
        }
        let mut containers = self.containers.borrow_mut();
        let Some(slot) = containers.get_mut(container_id) else {
            return Err(HostError::ContainerNotFound(container_id.to_owned()));
        };
        *slot = Some(node);
        Ok(())
    }

    fn unmount(&self, container_id: &str) {
        if let Some(slot) = self.containers.borrow_mut().get_mut(container_id) {
            *slot = None;
        }
    }
}

#[cfg(test)]
#[path = "host_test.rs"]
mod tests;
