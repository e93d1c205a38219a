//! Page-lifetime diagnostics log.
//!
//! DESIGN
//! ======
//! One append-only log shared by the loader, every error boundary, and the
//! host's global error hooks. Handles are cheap clones of an
//! `Rc<RefCell<..>>`; all writers run on the single UI thread, so the only
//! borrow conflict possible is re-entrancy (a sink or probe recording while a
//! record is in progress). `record` uses `try_borrow_mut` and counts such
//! events as lost instead of panicking.
//!
//! Every stored event is mirrored to `tracing` so native hosts get structured
//! logs without querying.
//!
//! TRADE-OFFS
//! ==========
//! The log is capped; the oldest events are evicted first. Queries are
//! bounded by the sequence number at query time, so an evicted event is
//! skipped rather than replaced by a newer one.

mod event;
mod filter;
mod sink;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use serde::Serialize;

use crate::config::DiagnosticsConfig;
use crate::error::{ErrorKind, ErrorRecord, now_ms};
use crate::loader::{LoadAttempt, LoadState};

pub use event::{DiagnosticEvent, EventPayload, HostSignal, Level, PayloadType};
pub use filter::EventFilter;
pub use sink::TelemetrySink;

#[derive(Clone)]
pub struct Diagnostics {
    inner: Rc<RefCell<DiagnosticsInner>>,
    /// Lost to re-entrant recording; kept outside the `RefCell`.
    lost: Rc<Cell<u64>>,
}

struct DiagnosticsInner {
    config: DiagnosticsConfig,
    events: VecDeque<Rc<DiagnosticEvent>>,
    next_seq: u64,
    evicted: u64,
    sink: Option<Rc<dyn TelemetrySink>>,
}

impl Diagnostics {
    #[must_use]
    pub fn new(config: DiagnosticsConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DiagnosticsInner {
                config,
                events: VecDeque::new(),
                next_seq: 0,
                evicted: 0,
                sink: None,
            })),
            lost: Rc::new(Cell::new(0)),
        }
    }

    // =========================================================================
    // CONFIGURATION
    // =========================================================================

    pub fn set_sink(&self, sink: Option<Rc<dyn TelemetrySink>>) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.sink = sink;
        }
    }

    pub fn set_level(&self, level: Level) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.config.min_level = level;
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.config.enabled = enabled;
        }
    }

    #[must_use]
    pub fn config(&self) -> DiagnosticsConfig {
        self.inner.try_borrow().map(|inner| inner.config).unwrap_or_default()
    }

    // =========================================================================
    // RECORDING
    // =========================================================================

    /// Append an event at the payload's default level. Never panics.
    pub fn record(&self, payload: EventPayload) {
        let level = payload.level();
        self.record_at(level, payload);
    }

    /// Append an event at an explicit level. Never panics.
    pub fn record_at(&self, level: Level, payload: EventPayload) {
        trace_event(level, &payload);

        let forwarded = {
            let Ok(mut inner) = self.inner.try_borrow_mut() else {
                self.lost.set(self.lost.get() + 1);
                return;
            };
            if !inner.config.enabled || level > inner.config.min_level {
                return;
            }

            let seq = inner.next_seq;
            inner.next_seq += 1;
            let sink = match &payload {
                EventPayload::Error { record, .. } => inner.sink.clone().map(|s| (s, record.clone())),
                _ => None,
            };
            inner.events.push_back(Rc::new(DiagnosticEvent { seq, timestamp: now_ms(), level, payload }));
            while inner.events.len() > inner.config.capacity {
                inner.events.pop_front();
                inner.evicted += 1;
            }
            sink
        };

        if let Some((sink, record)) = forwarded {
            sink::forward(sink.as_ref(), &record);
        }
    }

    pub fn record_error(&self, container_id: Option<&str>, record: ErrorRecord) {
        self.record(EventPayload::Error { container_id: container_id.map(str::to_owned), record });
    }

    pub fn record_transition(&self, attempt: &LoadAttempt) {
        self.record(EventPayload::Transition { attempt: attempt.clone() });
    }

    pub fn message(&self, level: Level, container_id: Option<&str>, message: impl Into<String>) {
        self.record_at(
            level,
            EventPayload::Message { container_id: container_id.map(str::to_owned), message: message.into() },
        );
    }

    pub fn timing(&self, container_id: &str, component: &str, duration_ms: u64) {
        self.record(EventPayload::Timing {
            container_id: container_id.to_owned(),
            component: component.to_owned(),
            duration_ms,
        });
    }

    /// Capture a failure raised by the host outside any tracked mount.
    pub fn capture_host_signal(&self, signal: HostSignal) {
        self.record_error(None, signal.into_record());
    }

    // =========================================================================
    // READING
    // =========================================================================

    /// Lazy, finite, restartable view over matching events recorded so far.
    #[must_use]
    pub fn query(&self, filter: EventFilter) -> Query {
        let (start, end) = self
            .inner
            .try_borrow()
            .map(|inner| (inner.events.front().map_or(inner.next_seq, |e| e.seq), inner.next_seq))
            .unwrap_or((0, 0));
        Query { log: self.clone(), filter, start, end, cursor: start }
    }

    /// Error records, oldest first.
    #[must_use]
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.query(EventFilter::all().payload(PayloadType::Error))
            .filter_map(|event| event.payload.record().cloned())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.try_borrow().map_or(0, |inner| inner.events.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events evicted by the capacity cap or lost to re-entrant recording.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        let evicted = self.inner.try_borrow().map_or(0, |inner| inner.evicted);
        evicted + self.lost.get()
    }

    /// Forget every event (full page reload). Sequence numbers keep growing.
    pub fn reset(&self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.events.clear();
            inner.evicted = 0;
        }
        self.lost.set(0);
    }

    #[must_use]
    pub fn report(&self) -> DiagnosticsReport {
        let mut errors_by_kind = BTreeMap::<ErrorKind, usize>::new();
        let mut mounted = 0usize;
        let mut fallen_back = 0usize;
        let mut total_events = 0usize;

        for event in self.query(EventFilter::all()) {
            total_events += 1;
            match &event.payload {
                EventPayload::Error { record, .. } => *errors_by_kind.entry(record.kind).or_insert(0) += 1,
                EventPayload::Transition { attempt } => match attempt.state {
                    LoadState::Mounted => mounted += 1,
                    LoadState::FallenBack => fallen_back += 1,
                    _ => {}
                },
                EventPayload::Message { .. } | EventPayload::Timing { .. } => {}
            }
        }

        DiagnosticsReport {
            total_events,
            errors_by_kind,
            mounted,
            fallen_back,
            dropped: self.dropped(),
            components: Vec::new(),
        }
    }

    fn event_at(&self, seq: u64) -> Option<Rc<DiagnosticEvent>> {
        let inner = self.inner.try_borrow().ok()?;
        let first = inner.events.front()?.seq;
        let index = usize::try_from(seq.checked_sub(first)?).ok()?;
        inner.events.get(index).cloned()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DiagnosticsConfig::default())
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics").field("len", &self.len()).field("dropped", &self.dropped()).finish()
    }
}

// =============================================================================
// QUERY
// =============================================================================

/// Iterator over events with `start <= seq < end` that match the filter.
#[derive(Clone, Debug)]
pub struct Query {
    log: Diagnostics,
    filter: EventFilter,
    start: u64,
    end: u64,
    cursor: u64,
}

impl Query {
    /// Rewind to the first event of the original range.
    pub fn restart(&mut self) {
        self.cursor = self.start;
    }
}

impl Iterator for Query {
    type Item = Rc<DiagnosticEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.end {
            let seq = self.cursor;
            self.cursor += 1;
            if let Some(event) = self.log.event_at(seq) {
                if self.filter.matches(&event) {
                    return Some(event);
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, usize::try_from(self.end - self.cursor).ok())
    }
}

// =============================================================================
// REPORT
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticsReport {
    pub total_events: usize,
    pub errors_by_kind: BTreeMap<ErrorKind, usize>,
    pub mounted: usize,
    pub fallen_back: usize,
    pub dropped: u64,
    /// Registered component names; filled in by the page context.
    pub components: Vec<String>,
}

impl DiagnosticsReport {
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors_by_kind.values().sum()
    }
}

fn trace_event(level: Level, payload: &EventPayload) {
    match payload {
        EventPayload::Transition { attempt } => {
            let error = attempt.error.as_ref().map(|e| e.message.as_str()).unwrap_or_default();
            match level {
                Level::Error => tracing::error!(container = %attempt.container_id(), component = %attempt.component_name(), state = %attempt.state, attempt_id = %attempt.id, error, "load transition"),
                Level::Warn => tracing::warn!(container = %attempt.container_id(), component = %attempt.component_name(), state = %attempt.state, attempt_id = %attempt.id, error, "load transition"),
                Level::Info => tracing::info!(container = %attempt.container_id(), component = %attempt.component_name(), state = %attempt.state, attempt_id = %attempt.id, "load transition"),
                Level::Debug => tracing::debug!(container = %attempt.container_id(), component = %attempt.component_name(), state = %attempt.state, attempt_id = %attempt.id, "load transition"),
            }
        }
        EventPayload::Error { container_id, record } => {
            let container = container_id.as_deref().unwrap_or("-");
            let component = record.source_component.as_deref().unwrap_or("-");
            tracing::error!(container, component, kind = %record.kind, message = %record.message, "captured error");
        }
        EventPayload::Message { container_id, message } => {
            let container = container_id.as_deref().unwrap_or("-");
            match level {
                Level::Error => tracing::error!(container, "{message}"),
                Level::Warn => tracing::warn!(container, "{message}"),
                Level::Info => tracing::info!(container, "{message}"),
                Level::Debug => tracing::debug!(container, "{message}"),
            }
        }
        EventPayload::Timing { container_id, component, duration_ms } => {
            tracing::debug!(container = %container_id, component = %component, duration_ms, "mount timing");
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
