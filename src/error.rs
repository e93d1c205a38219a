//! Error taxonomy shared by every stage of a mount cycle.
//!
//! DESIGN
//! ======
//! `ErrorRecord` is the unit the diagnostics log stores and the loader
//! branches on. Library-level failures that callers can act on (registry
//! overwrites, host rejections, bad configuration) are separate `thiserror`
//! enums so they compose with `?`.

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR KIND
// =============================================================================

/// Classification of a failure observed during a page lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A required service never became ready within the retry budget.
    MissingDependency,
    /// The target names a component that is not registered.
    MissingComponent,
    /// The widget threw (returned an error or panicked) while rendering.
    RenderException,
    /// Mounting did not finish before the deadline.
    Timeout,
    /// A resource outside any widget's render code failed.
    ResourceLoadFailure,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingDependency => "MissingDependency",
            Self::MissingComponent => "MissingComponent",
            Self::RenderException => "RenderException",
            Self::Timeout => "Timeout",
            Self::ResourceLoadFailure => "ResourceLoadFailure",
        }
    }

    /// Whether a failure of this kind can heal by re-running the mount step.
    #[must_use]
    pub fn is_mount_retryable(self) -> bool {
        matches!(self, Self::ResourceLoadFailure)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERROR RECORD
// =============================================================================

/// One captured failure. Append-only once handed to diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
    pub source_component: Option<String>,
    pub stack: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl ErrorRecord {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source_component: None,
            stack: None,
            timestamp: now_ms(),
        }
    }

    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.source_component = Some(component.into());
        self
    }

    #[must_use]
    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_component {
            Some(component) => write!(f, "{} in {component}: {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

// =============================================================================
// LIBRARY ERRORS
// =============================================================================

/// Returned by [`crate::registry::ComponentRegistry::register`].
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("component `{name}` is already registered with a different descriptor")]
    Overwrite { name: String },
}

/// Returned by [`crate::host::RenderHost`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("container `{0}` not found")]
    ContainerNotFound(String),
    #[error("host rejected view for `{container}`: {reason}")]
    Rejected { container: String, reason: String },
}

/// Failure reported by a widget's own render function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct WidgetError {
    pub message: String,
    pub stack: Option<String>,
}

impl WidgetError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), stack: None }
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

/// Returned by configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Returned by [`crate::page::PageManifest::from_json`].
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to parse page manifest: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("container `{0}` appears in more than one target")]
    DuplicateContainer(String),
    #[error("target for `{0}` has an empty component name")]
    EmptyComponent(String),
    #[error("manifest element `{0}` not found")]
    MissingElement(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Milliseconds since the Unix epoch, saturating to zero on clock skew.
#[must_use]
pub fn now_ms() -> i64 {
    #[cfg(feature = "hydrate")]
    {
        #[allow(clippy::cast_possible_truncation)]
        let ms = js_sys::Date::now() as i64;
        ms
    }
    #[cfg(not(feature = "hydrate"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
    }
}
