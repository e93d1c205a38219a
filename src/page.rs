//! One page lifetime: registry, services, diagnostics, and loader together.
//!
//! SYSTEM CONTEXT
//! ==============
//! The host page embeds a `PageManifest` (which widget goes in which
//! container, plus the raw data the static fallback reads). Bundles register
//! their widgets on the `PageContext`; `mount_manifest` then loads every
//! target. `teardown` ends the lifetime explicitly; nothing is looked up from
//! ambient globals.

use std::collections::BTreeSet;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::LoaderConfig;
use crate::deps::{DependencyChecker, ServiceDirectory};
use crate::diagnostics::{Diagnostics, DiagnosticsReport};
use crate::error::{ManifestError, RegistryError};
use crate::host::RenderHost;
use crate::loader::{LoadOutcome, MountTarget, SafeComponentLoader, Timer};
use crate::registry::{ComponentDescriptor, ComponentRegistry};

/// Service name of the rendering library itself, probed through the host.
pub const RENDERER_SERVICE: &str = "renderer";

// =============================================================================
// MANIFEST
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageManifest {
    #[serde(default)]
    pub targets: Vec<MountTarget>,
    /// Page-scoped raw data keyed by container id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<LoaderConfig>,
}

impl PageManifest {
    /// # Errors
    ///
    /// Returns [`ManifestError`] for malformed JSON, a container listed twice,
    /// a target without a component name, or an invalid embedded config.
    pub fn from_json(raw: &str) -> Result<Self, ManifestError> {
        let manifest: Self = serde_json::from_str(raw)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// # Errors
    ///
    /// See [`PageManifest::from_json`].
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut seen = BTreeSet::new();
        for target in &self.targets {
            if target.component_name.trim().is_empty() {
                return Err(ManifestError::EmptyComponent(target.container_id.clone()));
            }
            if !seen.insert(target.container_id.as_str()) {
                return Err(ManifestError::DuplicateContainer(target.container_id.clone()));
            }
        }
        if let Some(config) = &self.config {
            config.validate()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn container_ids(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.container_id.as_str()).collect()
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

pub struct PageContext {
    host: Rc<dyn RenderHost>,
    registry: Rc<ComponentRegistry>,
    services: Rc<ServiceDirectory>,
    diagnostics: Diagnostics,
    loader: SafeComponentLoader,
}

impl PageContext {
    #[must_use]
    pub fn new(host: Rc<dyn RenderHost>, timer: Rc<dyn Timer>, config: LoaderConfig) -> Self {
        let registry = Rc::new(ComponentRegistry::new());
        let services = Rc::new(ServiceDirectory::new());
        let probe_host = host.clone();
        services.register(RENDERER_SERVICE, Rc::new(move || probe_host.is_ready()));

        let diagnostics = Diagnostics::new(config.diagnostics);
        let checker = DependencyChecker::new(services.clone())
            .with_baseline(std::iter::once(RENDERER_SERVICE.to_owned()).chain(config.baseline_services.iter().cloned()));
        let loader = SafeComponentLoader::new(registry.clone(), checker, host.clone(), diagnostics.clone(), timer, config);

        tracing::debug!("page context created");
        Self { host, registry, services, diagnostics, loader }
    }

    /// Context sleeping on tokio timers.
    #[cfg(feature = "native")]
    #[must_use]
    pub fn with_tokio(host: Rc<dyn RenderHost>, config: LoaderConfig) -> Self {
        Self::new(host, Rc::new(crate::loader::TokioTimer), config)
    }

    /// Register a widget under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Overwrite`] if another descriptor already has
    /// the name.
    pub fn register(&self, descriptor: ComponentDescriptor) -> Result<Rc<ComponentDescriptor>, RegistryError> {
        let descriptor = Rc::new(descriptor);
        self.registry.register(descriptor.name.clone(), descriptor.clone())?;
        Ok(descriptor)
    }

    /// Store the manifest's data and load every target.
    pub async fn mount_manifest(&self, manifest: &PageManifest) -> Vec<LoadOutcome> {
        if let Some(data) = &manifest.data {
            self.loader.set_page_data(data.clone());
        }
        tracing::info!(targets = manifest.targets.len(), "mounting page manifest");
        self.loader.load_all(manifest.targets.iter().cloned()).await
    }

    /// Diagnostics summary including the registered component names.
    #[must_use]
    pub fn report(&self) -> DiagnosticsReport {
        let mut report = self.diagnostics.report();
        report.components = self.registry.names();
        report
    }

    /// End the page lifetime.
    pub fn teardown(&self) {
        self.loader.teardown();
        self.registry.teardown();
        self.diagnostics.reset();
        tracing::debug!("page context torn down");
    }

    #[must_use]
    pub fn host(&self) -> &Rc<dyn RenderHost> {
        &self.host
    }

    #[must_use]
    pub fn registry(&self) -> &Rc<ComponentRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn services(&self) -> &Rc<ServiceDirectory> {
        &self.services
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    #[must_use]
    pub fn loader(&self) -> &SafeComponentLoader {
        &self.loader
    }
}

impl std::fmt::Debug for PageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageContext")
            .field("registry", &self.registry)
            .field("services", &self.services)
            .field("diagnostics", &self.diagnostics)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "page_test.rs"]
mod tests;
