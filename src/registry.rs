//! Page-wide component registry.
//!
//! DESIGN
//! ======
//! Bundles register their widgets once at initialization; the loader only
//! reads. Descriptor identity is `Rc` pointer identity, so re-registering the
//! same `Rc` is a no-op while a different descriptor under a taken name is an
//! `Overwrite` error. The map lives behind a `RefCell` because registration
//! may happen after the loader already holds a handle (late bundles).

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::error::{RegistryError, WidgetError};
use crate::view::{Props, ViewNode};

pub type RenderFuture = LocalBoxFuture<'static, Result<ViewNode, WidgetError>>;
pub type RenderFn = Rc<dyn Fn(&Props) -> RenderFuture>;

// =============================================================================
// DESCRIPTOR
// =============================================================================

pub struct ComponentDescriptor {
    pub name: String,
    pub render: RenderFn,
    pub required_services: BTreeSet<String>,
}

impl ComponentDescriptor {
    /// Descriptor for a widget that renders synchronously.
    pub fn new<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&Props) -> Result<ViewNode, WidgetError> + 'static,
    {
        let render: RenderFn = Rc::new(move |props: &Props| futures::future::ready(render(props)).boxed_local());
        Self { name: name.into(), render, required_services: BTreeSet::new() }
    }

    /// Descriptor for a widget whose render waits on asynchronous work.
    pub fn deferred<F, Fut>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&Props) -> Fut + 'static,
        Fut: std::future::Future<Output = Result<ViewNode, WidgetError>> + 'static,
    {
        let render: RenderFn = Rc::new(move |props: &Props| render(props).boxed_local());
        Self { name: name.into(), render, required_services: BTreeSet::new() }
    }

    #[must_use]
    pub fn requires<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_services.extend(services.into_iter().map(Into::into));
        self
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("required_services", &self.required_services)
            .finish_non_exhaustive()
    }
}

/// Result of a registry read.
#[derive(Clone, Debug)]
pub enum Lookup {
    Found(Rc<ComponentDescriptor>),
    NotFound,
}

impl Lookup {
    #[must_use]
    pub fn found(self) -> Option<Rc<ComponentDescriptor>> {
        match self {
            Self::Found(descriptor) => Some(descriptor),
            Self::NotFound => None,
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: RefCell<BTreeMap<String, Rc<ComponentDescriptor>>>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Overwrite`] if `name` is already bound to a
    /// different descriptor.
    pub fn register(&self, name: impl Into<String>, descriptor: Rc<ComponentDescriptor>) -> Result<(), RegistryError> {
        let name = name.into();
        let mut components = self.components.borrow_mut();
        if let Some(existing) = components.get(&name) {
            if Rc::ptr_eq(existing, &descriptor) {
                return Ok(());
            }
            tracing::warn!(component = %name, "rejected registry overwrite");
            return Err(RegistryError::Overwrite { name });
        }
        tracing::debug!(component = %name, "component registered");
        components.insert(name, descriptor);
        Ok(())
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Lookup {
        self.components
            .borrow()
            .get(name)
            .cloned()
            .map_or(Lookup::NotFound, Lookup::Found)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.components.borrow().contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.components.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.borrow().is_empty()
    }

    /// Drop every registration. Only for page-lifecycle end.
    pub fn teardown(&self) {
        self.components.borrow_mut().clear();
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
