//! Resilient widget mounting for server-rendered pages.
//!
//! Pages name containers and the widget each should show. This crate decides,
//! per container, whether the rich widget renders, is retried, or is replaced
//! by a static fallback built from the page's raw data, and records everything
//! it observed in a queryable diagnostics log. A failure in one widget never
//! leaves its container blank and never affects its siblings.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`registry`] | Component name to render function |
//! | [`deps`] | Service readiness probes and the dependency checker |
//! | [`loader`] | The per-container load state machine |
//! | [`boundary`] | Render/update failure containment |
//! | [`fallback`] | Static view from raw page data |
//! | [`diagnostics`] | Event log, filters, host signals, telemetry sink |
//! | [`view`] / [`host`] | View tree and the rendering host boundary |
//! | [`page`] | One page lifetime wired together, plus the page manifest |
//! | [`config`] | Retry budgets, deadlines, fallback copy |
//! | `web` | Browser host (feature `hydrate`) |

pub mod boundary;
pub mod config;
pub mod deps;
pub mod diagnostics;
pub mod error;
pub mod fallback;
pub mod host;
pub mod loader;
pub mod page;
pub mod registry;
pub mod view;
#[cfg(feature = "hydrate")]
pub mod web;

pub use boundary::{BoundaryState, ErrorBoundary};
pub use config::{BackoffConfig, DiagnosticsConfig, LoaderConfig};
pub use deps::{DependencyChecker, ReadyFlag, Readiness, ServiceDirectory, ServiceProbe};
pub use diagnostics::{Diagnostics, DiagnosticsReport, EventFilter, HostSignal, Level, TelemetrySink};
pub use error::{ConfigError, ErrorKind, ErrorRecord, HostError, ManifestError, RegistryError, WidgetError};
pub use fallback::StaticFallbackRenderer;
pub use host::{MemoryHost, RenderHost};
pub use loader::{LoadAttempt, LoadOutcome, LoadState, MountTarget, SafeComponentLoader, Timer, UpdateOutcome};
pub use page::{PageContext, PageManifest};
pub use registry::{ComponentDescriptor, ComponentRegistry, Lookup};
pub use view::{Props, ViewNode};
