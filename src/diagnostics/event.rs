//! Diagnostics event model.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ErrorRecord};
use crate::loader::{LoadAttempt, LoadState};

/// Severity, most severe first so `Ord` reads as "at least as severe".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl Level {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => Err(format!("unknown level '{other}' (expected error, warn, info or debug)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// One state-machine step, with the attempt as it stood after the step.
    Transition { attempt: LoadAttempt },
    Error {
        container_id: Option<String>,
        record: ErrorRecord,
    },
    Message {
        container_id: Option<String>,
        message: String,
    },
    Timing {
        container_id: String,
        component: String,
        duration_ms: u64,
    },
}

/// Discriminant of [`EventPayload`] used for filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadType {
    Transition,
    Error,
    Message,
    Timing,
}

impl EventPayload {
    #[must_use]
    pub fn payload_type(&self) -> PayloadType {
        match self {
            Self::Transition { .. } => PayloadType::Transition,
            Self::Error { .. } => PayloadType::Error,
            Self::Message { .. } => PayloadType::Message,
            Self::Timing { .. } => PayloadType::Timing,
        }
    }

    #[must_use]
    pub fn container_id(&self) -> Option<&str> {
        match self {
            Self::Transition { attempt } => Some(attempt.container_id()),
            Self::Error { container_id, .. } | Self::Message { container_id, .. } => container_id.as_deref(),
            Self::Timing { container_id, .. } => Some(container_id),
        }
    }

    #[must_use]
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::Transition { attempt } => Some(attempt.component_name()),
            Self::Error { record, .. } => record.source_component.as_deref(),
            Self::Message { .. } => None,
            Self::Timing { component, .. } => Some(component),
        }
    }

    /// Kind of the recorded error; `None` for every other payload.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Error { record, .. } => Some(record.kind),
            _ => None,
        }
    }

    /// Kind of the error a transition snapshot carries (`Failed`, `FallenBack`).
    #[must_use]
    pub fn attempt_error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Transition { attempt } => attempt.error.as_ref().map(|e| e.kind),
            _ => None,
        }
    }

    #[must_use]
    pub fn record(&self) -> Option<&ErrorRecord> {
        match self {
            Self::Error { record, .. } => Some(record),
            _ => None,
        }
    }

    #[must_use]
    pub fn state(&self) -> Option<LoadState> {
        match self {
            Self::Transition { attempt } => Some(attempt.state),
            _ => None,
        }
    }

    /// Default level for this payload.
    #[must_use]
    pub fn level(&self) -> Level {
        match self {
            Self::Transition { attempt } => match attempt.state {
                LoadState::Failed | LoadState::FallenBack => Level::Warn,
                LoadState::Mounted => Level::Info,
                LoadState::Pending | LoadState::DependenciesChecked | LoadState::Mounting => Level::Debug,
            },
            Self::Error { .. } => Level::Error,
            Self::Message { .. } => Level::Info,
            Self::Timing { .. } => Level::Debug,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiagnosticEvent {
    /// Monotonic across the page lifetime, never reused after `reset`.
    pub seq: u64,
    pub timestamp: i64,
    pub level: Level,
    pub payload: EventPayload,
}

/// Failure signals raised by the hosting environment outside any widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostSignal {
    UncaughtError {
        message: String,
        source: Option<String>,
        line: Option<u32>,
        column: Option<u32>,
        /// Set when the host can attribute the error to a widget.
        component: Option<String>,
        stack: Option<String>,
    },
    UnhandledRejection {
        reason: String,
    },
    NetworkFailure {
        url: String,
        status: Option<u16>,
        context: String,
    },
}

impl HostSignal {
    /// Convert to the record diagnostics stores.
    #[must_use]
    pub fn into_record(self) -> ErrorRecord {
        match self {
            Self::UncaughtError { message, source, line, column, component, stack } => {
                let location = match (source, line, column) {
                    (Some(src), Some(l), Some(c)) => format!(" ({src}:{l}:{c})"),
                    (Some(src), Some(l), None) => format!(" ({src}:{l})"),
                    (Some(src), None, _) => format!(" ({src})"),
                    (None, _, _) => String::new(),
                };
                let text = format!("uncaught error: {message}{location}");
                match component {
                    Some(component) => ErrorRecord::new(ErrorKind::RenderException, text)
                        .with_component(component)
                        .with_stack(stack),
                    None => ErrorRecord::new(ErrorKind::ResourceLoadFailure, text).with_stack(stack),
                }
            }
            Self::UnhandledRejection { reason } => {
                ErrorRecord::new(ErrorKind::ResourceLoadFailure, format!("unhandled rejection: {reason}"))
            }
            Self::NetworkFailure { url, status, context } => {
                let status = status.map(|s| format!(" status {s}")).unwrap_or_default();
                ErrorRecord::new(ErrorKind::ResourceLoadFailure, format!("network failure{status} for {url} ({context})"))
            }
        }
    }
}
