//! Resilient mount orchestration.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `SafeComponentLoader` per page. For each container it drives a load
//! cycle through `Pending -> DependenciesChecked -> Mounting -> Mounted`, and
//! on any failure through `Failed -> FallenBack`, rendering the static
//! fallback. Every transition is published to diagnostics with the attempt
//! snapshot.
//!
//! DESIGN
//! ======
//! - A cycle is a `Shared` future stored in the container's slot. A second
//!   `load` for the same component, props and fallback data while it is in
//!   flight gets a clone of that future instead of starting a parallel attempt.
//! - A `load` differing in any of those, `unmount`, or `teardown`
//!   retires the slot's cycle id. The old cycle checks its id after every
//!   suspension point and resolves to `LoadOutcome::Superseded` without
//!   touching the container again.
//! - Suspension points are the dependency backoff sleep and the widget render,
//!   which runs under the mount deadline.
//!
//! ERROR HANDLING
//! ==============
//! `MissingDependency` gets bounded backoff re-checks. `MissingComponent`,
//! `RenderException` and `Timeout` fall back immediately.
//! `ResourceLoadFailure` raised while mounting (host rejected the view, or the
//! container stayed empty) retries the mount up to `mount_retries` times, each
//! retry as a new `LoadAttempt`. The returned future drives the cycle; it must
//! be polled for the cycle to make progress.

mod attempt;
mod backoff;
mod timer;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared, join_all};
use serde_json::Value;
use uuid::Uuid;

use crate::boundary::ErrorBoundary;
use crate::config::LoaderConfig;
use crate::deps::{DependencyChecker, Readiness};
use crate::diagnostics::{Diagnostics, Level};
use crate::error::{ErrorKind, ErrorRecord, HostError, now_ms};
use crate::fallback::StaticFallbackRenderer;
use crate::host::RenderHost;
use crate::registry::{ComponentDescriptor, ComponentRegistry};
use crate::view::{Props, ViewNode};

pub use attempt::{LoadAttempt, LoadState, MountTarget};
pub use backoff::Backoff;
#[cfg(feature = "hydrate")]
pub use timer::GlooTimer;
pub use timer::Timer;
#[cfg(feature = "native")]
pub use timer::TokioTimer;

use timer::with_deadline;

/// Handle to an in-flight or finished load cycle.
pub type LoadFuture = Shared<LocalBoxFuture<'static, LoadOutcome>>;

#[derive(Clone, Debug, PartialEq)]
pub enum LoadOutcome {
    Mounted(LoadAttempt),
    FallenBack(LoadAttempt),
    /// A newer request for the container retired this cycle.
    Superseded,
}

impl LoadOutcome {
    #[must_use]
    pub fn attempt(&self) -> Option<&LoadAttempt> {
        match self {
            Self::Mounted(attempt) | Self::FallenBack(attempt) => Some(attempt),
            Self::Superseded => None,
        }
    }

    #[must_use]
    pub fn state(&self) -> Option<LoadState> {
        self.attempt().map(|a| a.state)
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        matches!(self, Self::Mounted(_))
    }
}

/// Result of re-rendering a mounted widget with new props.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOutcome {
    Rendered,
    /// The widget threw; the boundary's inline notice replaced it.
    Notice(ErrorRecord),
    /// The update missed the deadline; the previous output stays.
    TimedOut(ErrorRecord),
    /// The host refused the new view; the previous output stays.
    Rejected(ErrorRecord),
    NotMounted,
}

// =============================================================================
// LOADER
// =============================================================================

#[derive(Clone)]
pub struct SafeComponentLoader {
    inner: Rc<LoaderInner>,
}

struct LoaderInner {
    registry: Rc<ComponentRegistry>,
    checker: DependencyChecker,
    host: Rc<dyn RenderHost>,
    fallback: StaticFallbackRenderer,
    diagnostics: Diagnostics,
    timer: Rc<dyn Timer>,
    config: LoaderConfig,
    slots: RefCell<BTreeMap<String, Slot>>,
    page_data: RefCell<Option<Value>>,
}

/// Per-container bookkeeping.
#[derive(Default)]
struct Slot {
    cycle_id: Option<Uuid>,
    component: String,
    props: Props,
    fallback_data: Option<Value>,
    in_flight: Option<LoadFuture>,
    state: Option<LoadState>,
    history: Vec<LoadAttempt>,
    mounted: Option<(Rc<ComponentDescriptor>, ErrorBoundary)>,
}

impl SafeComponentLoader {
    #[must_use]
    pub fn new(
        registry: Rc<ComponentRegistry>,
        checker: DependencyChecker,
        host: Rc<dyn RenderHost>,
        diagnostics: Diagnostics,
        timer: Rc<dyn Timer>,
        config: LoaderConfig,
    ) -> Self {
        let fallback = StaticFallbackRenderer::new(host.clone(), &config);
        Self {
            inner: Rc::new(LoaderInner {
                registry,
                checker,
                host,
                fallback,
                diagnostics,
                timer,
                config,
                slots: RefCell::new(BTreeMap::new()),
                page_data: RefCell::new(None),
            }),
        }
    }

    /// Start (or join) the load cycle for `target.container_id`.
    pub fn load(&self, target: MountTarget) -> LoadFuture {
        let container = target.container_id.clone();
        let mut superseded = false;

        let future = {
            let mut slots = self.inner.slots.borrow_mut();
            let slot = slots.entry(container.clone()).or_default();
            if let Some(in_flight) = &slot.in_flight {
                if slot.component == target.component_name
                    && slot.props == target.props
                    && slot.fallback_data == target.fallback_data
                {
                    tracing::debug!(container = %container, component = %target.component_name, "coalesced load request");
                    return in_flight.clone();
                }
                superseded = true;
            }

            let cycle_id = Uuid::new_v4();
            slot.cycle_id = Some(cycle_id);
            slot.component.clone_from(&target.component_name);
            slot.props.clone_from(&target.props);
            slot.fallback_data.clone_from(&target.fallback_data);
            slot.mounted = None;
            let future = Rc::clone(&self.inner).run_cycle(cycle_id, target).boxed_local().shared();
            slot.in_flight = Some(future.clone());
            future
        };

        if superseded {
            self.inner.host.unmount(&container);
            self.inner
                .diagnostics
                .message(Level::Info, Some(&container), "in-flight load superseded by a newer request");
        }
        future
    }

    /// Load every target concurrently; outcomes are in input order.
    pub async fn load_all(&self, targets: impl IntoIterator<Item = MountTarget>) -> Vec<LoadOutcome> {
        join_all(targets.into_iter().map(|target| self.load(target))).await
    }

    /// Re-render the widget mounted in `container_id` with new props.
    pub async fn update(&self, container_id: &str, props: Props) -> UpdateOutcome {
        let current = {
            let slots = self.inner.slots.borrow();
            slots
                .get(container_id)
                .filter(|slot| slot.in_flight.is_none())
                .and_then(|slot| slot.mounted.clone().zip(slot.cycle_id))
        };
        let Some(((descriptor, mut boundary), cycle_id)) = current else {
            return UpdateOutcome::NotMounted;
        };

        let deadline = self.inner.mount_deadline();
        let rendered = with_deadline(deadline, boundary.render(&descriptor, &props)).await;
        if !self.inner.is_current(container_id, cycle_id) {
            return UpdateOutcome::NotMounted;
        }

        let outcome = match rendered {
            Some(Ok(view)) => match self.inner.host.mount(container_id, view) {
                Ok(()) => UpdateOutcome::Rendered,
                Err(err) => {
                    let record = ErrorRecord::new(ErrorKind::ResourceLoadFailure, err.to_string())
                        .with_component(descriptor.name.as_str());
                    self.inner.diagnostics.record_error(Some(container_id), record.clone());
                    UpdateOutcome::Rejected(record)
                }
            },
            Some(Err(record)) => {
                if let Err(err) = self.inner.host.mount(container_id, boundary.notice_view()) {
                    tracing::warn!(container = %container_id, error = %err, "boundary notice not rendered");
                }
                UpdateOutcome::Notice(record)
            }
            None => {
                let record = self.inner.timeout_record(&descriptor.name);
                self.inner.diagnostics.record_error(Some(container_id), record.clone());
                UpdateOutcome::TimedOut(record)
            }
        };

        if let Some(slot) = self.inner.slots.borrow_mut().get_mut(container_id) {
            if matches!(outcome, UpdateOutcome::Rendered | UpdateOutcome::Notice(_)) {
                slot.props = props;
            }
            slot.mounted = Some((descriptor, boundary));
        }
        outcome
    }

    /// Retire any in-flight cycle for `container_id` and clear the container.
    /// Finished attempt history is kept.
    pub fn unmount(&self, container_id: &str) {
        let had_cycle = {
            let mut slots = self.inner.slots.borrow_mut();
            slots.get_mut(container_id).is_some_and(|slot| {
                let in_flight = slot.in_flight.take().is_some();
                slot.cycle_id = None;
                slot.state = None;
                slot.mounted = None;
                in_flight
            })
        };
        self.inner.host.unmount(container_id);
        if had_cycle {
            self.inner
                .diagnostics
                .message(Level::Info, Some(container_id), "in-flight load cancelled by unmount");
        }
    }

    /// Retire every cycle, clear every touched container, and forget all slots
    /// and the page data.
    pub fn teardown(&self) {
        let containers = std::mem::take(&mut *self.inner.slots.borrow_mut());
        self.inner.page_data.borrow_mut().take();
        for container in containers.keys() {
            self.inner.host.unmount(container);
        }
        tracing::debug!(containers = containers.len(), "loader torn down");
    }

    /// Store the page-scoped data blob used as fallback raw data.
    pub fn set_page_data(&self, data: Value) {
        *self.inner.page_data.borrow_mut() = Some(data);
    }

    #[must_use]
    pub fn page_data(&self) -> Option<Value> {
        self.inner.page_data.borrow().clone()
    }

    /// Latest state of the container's current cycle.
    #[must_use]
    pub fn state(&self, container_id: &str) -> Option<LoadState> {
        self.inner.slots.borrow().get(container_id).and_then(|slot| slot.state)
    }

    /// Finished attempts for the container, oldest first.
    #[must_use]
    pub fn attempts(&self, container_id: &str) -> Vec<LoadAttempt> {
        self.inner
            .slots
            .borrow()
            .get(container_id)
            .map(|slot| slot.history.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn containers(&self) -> Vec<String> {
        self.inner.slots.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub fn is_loading(&self, container_id: &str) -> bool {
        self.inner.slots.borrow().get(container_id).is_some_and(|slot| slot.in_flight.is_some())
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.inner.diagnostics
    }

    #[must_use]
    pub fn registry(&self) -> &Rc<ComponentRegistry> {
        &self.inner.registry
    }

    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for SafeComponentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeComponentLoader")
            .field("containers", &self.containers())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// CYCLE
// =============================================================================

impl LoaderInner {
    async fn run_cycle(self: Rc<Self>, cycle_id: Uuid, target: MountTarget) -> LoadOutcome {
        let container = target.container_id.clone();
        let component = target.component_name.clone();
        if !self.is_current(&container, cycle_id) {
            return LoadOutcome::Superseded;
        }

        let mut attempt = LoadAttempt::start(cycle_id, target);
        self.publish(&attempt);

        // Pending -> DependenciesChecked, with bounded backoff re-checks.
        let mut backoff = Backoff::new(self.config.dependency);
        loop {
            let required = self
                .registry
                .lookup(&component)
                .found()
                .map(|descriptor| descriptor.required_services.clone())
                .unwrap_or_default();
            let Readiness::NotReady { missing } = self.checker.check_ready(&required) else {
                break;
            };
            let missing = missing.into_iter().collect::<Vec<_>>().join(", ");
            let Some(delay) = backoff.next_delay() else {
                let record = ErrorRecord::new(
                    ErrorKind::MissingDependency,
                    format!("services not ready after {} re-checks: {missing}", backoff.retries()),
                )
                .with_component(component.as_str());
                return self.fail_and_fall_back(attempt, record);
            };
            self.diagnostics.message(
                Level::Debug,
                Some(&container),
                format!("dependencies not ready ({missing}); re-check {} in {} ms", backoff.retries(), delay.as_millis()),
            );
            self.timer.sleep(delay).await;
            if !self.is_current(&container, cycle_id) {
                return LoadOutcome::Superseded;
            }
        }
        attempt.advance(LoadState::DependenciesChecked);
        self.publish(&attempt);

        // DependenciesChecked -> Mounting requires a registration and a container.
        let Some(descriptor) = self.registry.lookup(&component).found() else {
            let record = ErrorRecord::new(ErrorKind::MissingComponent, format!("component `{component}` is not registered"))
                .with_component(component.as_str());
            return self.fail_and_fall_back(attempt, record);
        };
        if !self.host.has_container(&container) {
            let record = ErrorRecord::new(
                ErrorKind::ResourceLoadFailure,
                HostError::ContainerNotFound(container.clone()).to_string(),
            )
            .with_component(component.as_str());
            return self.fail_and_fall_back(attempt, record);
        }

        let mut boundary = ErrorBoundary::new(component.as_str(), self.diagnostics.clone()).with_container(container.as_str());
        let mut retries_left = self.config.mount_retries;
        loop {
            attempt.advance(LoadState::Mounting);
            self.publish(&attempt);
            self.host.unmount(&container);
            if self.config.show_loading_indicator {
                if let Err(err) = self.host.mount(&container, loading_view(&component)) {
                    tracing::debug!(container = %container, error = %err, "loading indicator not shown");
                }
            }

            let started = now_ms();
            let props = attempt.target.props.clone();
            let rendered = with_deadline(self.mount_deadline(), boundary.render(&descriptor, &props)).await;
            if !self.is_current(&container, cycle_id) {
                return LoadOutcome::Superseded;
            }

            let record = match rendered {
                None => self.timeout_record(&component),
                // Already recorded by the boundary.
                Some(Err(record)) => record,
                Some(Ok(view)) => {
                    self.host.unmount(&container);
                    match self.host.mount(&container, view) {
                        Ok(()) if !self.host.is_empty(&container) => {
                            let duration_ms = u64::try_from(now_ms() - started).unwrap_or(0);
                            self.diagnostics.timing(&container, &component, duration_ms);
                            attempt.advance(LoadState::Mounted);
                            attempt.finish();
                            self.publish(&attempt);
                            self.settle(&attempt, Some((descriptor, boundary)));
                            return LoadOutcome::Mounted(attempt);
                        }
                        Ok(()) => ErrorRecord::new(ErrorKind::ResourceLoadFailure, "container is empty after render")
                            .with_component(component.as_str()),
                        Err(err) => {
                            ErrorRecord::new(ErrorKind::ResourceLoadFailure, err.to_string()).with_component(component.as_str())
                        }
                    }
                }
            };

            if record.kind.is_mount_retryable() && retries_left > 0 {
                retries_left -= 1;
                self.diagnostics.record_error(Some(&container), record.clone());
                self.host.unmount(&container);
                attempt.error = Some(record);
                attempt.advance(LoadState::Failed);
                attempt.finish();
                self.publish(&attempt);
                let next = attempt.retry();
                self.archive(attempt);
                attempt = next;
                continue;
            }
            return self.fail_and_fall_back(attempt, record);
        }
    }

    /// `Failed -> FallenBack`. Unconditional; never fails.
    fn fail_and_fall_back(&self, mut attempt: LoadAttempt, record: ErrorRecord) -> LoadOutcome {
        let container = attempt.container_id().to_owned();
        if record.kind != ErrorKind::RenderException {
            self.diagnostics.record_error(Some(&container), record.clone());
        }
        attempt.error = Some(record);
        attempt.advance(LoadState::Failed);
        self.publish(&attempt);

        self.host.unmount(&container);
        let raw = self.raw_data(&attempt.target);
        self.fallback
            .render_component_fallback(&container, attempt.component_name(), raw.as_ref());

        attempt.advance(LoadState::FallenBack);
        attempt.finish();
        self.publish(&attempt);
        self.settle(&attempt, None);
        LoadOutcome::FallenBack(attempt)
    }

    fn is_current(&self, container_id: &str, cycle_id: Uuid) -> bool {
        self.slots
            .borrow()
            .get(container_id)
            .is_some_and(|slot| slot.cycle_id == Some(cycle_id))
    }

    fn publish(&self, attempt: &LoadAttempt) {
        if let Some(slot) = self.slots.borrow_mut().get_mut(attempt.container_id()) {
            slot.state = Some(attempt.state);
        }
        self.diagnostics.record_transition(attempt);
    }

    fn archive(&self, attempt: LoadAttempt) {
        if let Some(slot) = self.slots.borrow_mut().get_mut(attempt.container_id()) {
            slot.history.push(attempt);
        }
    }

    /// Close the cycle: archive the final attempt and release the in-flight handle.
    fn settle(&self, attempt: &LoadAttempt, mounted: Option<(Rc<ComponentDescriptor>, ErrorBoundary)>) {
        let released = {
            let mut slots = self.slots.borrow_mut();
            slots.get_mut(attempt.container_id()).and_then(|slot| {
                slot.history.push(attempt.clone());
                slot.mounted = mounted;
                slot.in_flight.take()
            })
        };
        drop(released);
    }

    /// `target.fallback_data`, else the page blob's entry for the container.
    fn raw_data(&self, target: &MountTarget) -> Option<Value> {
        target.fallback_data.clone().or_else(|| {
            self.page_data
                .borrow()
                .as_ref()
                .and_then(|blob| blob.get(&target.container_id))
                .cloned()
        })
    }

    fn mount_deadline(&self) -> LocalBoxFuture<'static, ()> {
        self.timer.sleep(Duration::from_millis(self.config.mount_timeout_ms))
    }

    fn timeout_record(&self, component: &str) -> ErrorRecord {
        ErrorRecord::new(
            ErrorKind::Timeout,
            format!("mount did not finish within {} ms", self.config.mount_timeout_ms),
        )
        .with_component(component)
    }
}

fn loading_view(component: &str) -> ViewNode {
    ViewNode::element("div")
        .attr("class", "mg-loading")
        .attr("aria-busy", "true")
        .attr("data-component", component)
        .child(ViewNode::text("Loading..."))
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
