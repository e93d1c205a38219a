//! Event selection for [`super::Diagnostics::query`].

use crate::error::ErrorKind;

use super::event::{DiagnosticEvent, Level, PayloadType};

/// Conjunction of optional predicates; the default filter matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventFilter {
    kind: Option<ErrorKind>,
    failed_with: Option<ErrorKind>,
    max_level: Option<Level>,
    container_id: Option<String>,
    component: Option<String>,
    payload: Option<PayloadType>,
}

impl EventFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn errors_of(kind: ErrorKind) -> Self {
        Self::default().kind(kind)
    }

    /// Only `Error` records of this kind; transitions never match.
    #[must_use]
    pub fn kind(mut self, kind: ErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Only transitions whose attempt snapshot carries an error of this kind.
    #[must_use]
    pub fn failed_with(mut self, kind: ErrorKind) -> Self {
        self.failed_with = Some(kind);
        self
    }

    /// Keep events at least as severe as `level`.
    #[must_use]
    pub fn at_least(mut self, level: Level) -> Self {
        self.max_level = Some(level);
        self
    }

    #[must_use]
    pub fn container(mut self, container_id: impl Into<String>) -> Self {
        self.container_id = Some(container_id.into());
        self
    }

    #[must_use]
    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    #[must_use]
    pub fn payload(mut self, payload: PayloadType) -> Self {
        self.payload = Some(payload);
        self
    }

    #[must_use]
    pub fn matches(&self, event: &DiagnosticEvent) -> bool {
        if let Some(kind) = self.kind {
            if event.payload.error_kind() != Some(kind) {
                return false;
            }
        }
        if let Some(kind) = self.failed_with {
            if event.payload.attempt_error_kind() != Some(kind) {
                return false;
            }
        }
        if let Some(max_level) = self.max_level {
            if event.level > max_level {
                return false;
            }
        }
        if let Some(container_id) = &self.container_id {
            if event.payload.container_id() != Some(container_id.as_str()) {
                return false;
            }
        }
        if let Some(component) = &self.component {
            if event.payload.component() != Some(component.as_str()) {
                return false;
            }
        }
        if let Some(payload) = self.payload {
            if event.payload.payload_type() != payload {
                return false;
            }
        }
        true
    }
}
