//! Readiness gating for widget prerequisites.
//!
//! SYSTEM CONTEXT
//! ==============
//! Companion initializers (auth bootstrap, data services, the rendering
//! library itself) register a readiness probe in the `ServiceDirectory`. The
//! `DependencyChecker` answers "are all of these ready right now" without side
//! effects; retry policy belongs to the loader.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// Boolean-readable "is this service initialized" probe.
pub trait ServiceProbe {
    fn is_ready(&self) -> bool;
}

impl<F> ServiceProbe for F
where
    F: Fn() -> bool,
{
    fn is_ready(&self) -> bool {
        self()
    }
}

/// Probe an external initializer flips once it has finished.
#[derive(Clone, Debug, Default)]
pub struct ReadyFlag(Rc<Cell<bool>>);

impl ReadyFlag {
    #[must_use]
    pub fn new(ready: bool) -> Self {
        Self(Rc::new(Cell::new(ready)))
    }

    pub fn set(&self, ready: bool) {
        self.0.set(ready);
    }

    #[must_use]
    pub fn get(&self) -> bool {
        self.0.get()
    }
}

impl ServiceProbe for ReadyFlag {
    fn is_ready(&self) -> bool {
        self.get()
    }
}

// =============================================================================
// SERVICE DIRECTORY
// =============================================================================

#[derive(Default)]
pub struct ServiceDirectory {
    probes: RefCell<BTreeMap<String, Rc<dyn ServiceProbe>>>,
}

impl ServiceDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the probe for `name`.
    pub fn register(&self, name: impl Into<String>, probe: Rc<dyn ServiceProbe>) {
        self.probes.borrow_mut().insert(name.into(), probe);
    }

    /// Register a [`ReadyFlag`] for `name` and return it for the initializer.
    pub fn flag(&self, name: impl Into<String>, ready: bool) -> ReadyFlag {
        let flag = ReadyFlag::new(ready);
        self.register(name, Rc::new(flag.clone()));
        flag
    }

    pub fn remove(&self, name: &str) {
        self.probes.borrow_mut().remove(name);
    }

    /// Unregistered services are never ready.
    #[must_use]
    pub fn is_ready(&self, name: &str) -> bool {
        let probe = self.probes.borrow().get(name).cloned();
        probe.is_some_and(|p| p.is_ready())
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.probes.borrow().keys().cloned().collect()
    }

    pub fn clear(&self) {
        self.probes.borrow_mut().clear();
    }
}

impl std::fmt::Debug for ServiceDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDirectory").field("names", &self.names()).finish()
    }
}

// =============================================================================
// CHECKER
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NotReady { missing: BTreeSet<String> },
}

impl Readiness {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

#[derive(Clone, Debug)]
pub struct DependencyChecker {
    services: Rc<ServiceDirectory>,
    baseline: BTreeSet<String>,
}

impl DependencyChecker {
    #[must_use]
    pub fn new(services: Rc<ServiceDirectory>) -> Self {
        Self { services, baseline: BTreeSet::new() }
    }

    /// Services every component needs on top of its own requirements.
    #[must_use]
    pub fn with_baseline<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.baseline.extend(services.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn baseline(&self) -> &BTreeSet<String> {
        &self.baseline
    }

    #[must_use]
    pub fn services(&self) -> &Rc<ServiceDirectory> {
        &self.services
    }

    /// Check `required` plus the baseline. Pure; safe to call repeatedly.
    #[must_use]
    pub fn check_ready(&self, required: &BTreeSet<String>) -> Readiness {
        let missing = self
            .baseline
            .iter()
            .chain(required)
            .filter(|name| !self.services.is_ready(name))
            .cloned()
            .collect::<BTreeSet<_>>();
        if missing.is_empty() { Readiness::Ready } else { Readiness::NotReady { missing } }
    }
}

#[cfg(test)]
#[path = "deps_test.rs"]
mod tests;
