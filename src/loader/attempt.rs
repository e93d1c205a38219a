//! Mount targets and the per-cycle attempt record.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ErrorRecord, now_ms};
use crate::view::Props;

/// A request to show one widget in one container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MountTarget {
    pub container_id: String,
    pub component_name: String,
    #[serde(default)]
    pub props: Props,
    /// Raw data for the static fallback; overrides the page-level blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_data: Option<Value>,
}

impl MountTarget {
    #[must_use]
    pub fn new(container_id: impl Into<String>, component_name: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            component_name: component_name.into(),
            props: Props::new(),
            fallback_data: None,
        }
    }

    #[must_use]
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    #[must_use]
    pub fn with_fallback_data(mut self, data: Value) -> Self {
        self.fallback_data = Some(data);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadState {
    Pending,
    DependenciesChecked,
    Mounting,
    Mounted,
    Failed,
    FallenBack,
}

impl LoadState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Mounted | Self::FallenBack)
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::DependenciesChecked | Self::Failed)
                | (Self::DependenciesChecked, Self::Mounting | Self::Failed)
                | (Self::Mounting, Self::Mounted | Self::Failed)
                | (Self::Failed, Self::FallenBack | Self::Mounting)
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::DependenciesChecked => "DependenciesChecked",
            Self::Mounting => "Mounting",
            Self::Mounted => "Mounted",
            Self::Failed => "Failed",
            Self::FallenBack => "FallenBack",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// History of one pass through the state machine.
///
/// A mount retry starts a fresh record (new `id`, same `cycle_id`,
/// `attempt_count + 1`); finished records are never touched again.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoadAttempt {
    pub id: Uuid,
    /// Shared by every attempt of one load cycle; retired on supersede.
    pub cycle_id: Uuid,
    pub target: MountTarget,
    pub state: LoadState,
    pub error: Option<ErrorRecord>,
    pub attempt_count: u32,
    pub started_at: i64,
    pub finished_at: Option<i64>,
}

impl LoadAttempt {
    pub(crate) fn start(cycle_id: Uuid, target: MountTarget) -> Self {
        Self {
            id: Uuid::new_v4(),
            cycle_id,
            target,
            state: LoadState::Pending,
            error: None,
            attempt_count: 1,
            started_at: now_ms(),
            finished_at: None,
        }
    }

    /// Next record after a retryable mount failure. Starts in `Failed` so the
    /// first transition it takes is `Failed -> Mounting`.
    pub(crate) fn retry(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            cycle_id: self.cycle_id,
            target: self.target.clone(),
            state: LoadState::Failed,
            error: None,
            attempt_count: self.attempt_count + 1,
            started_at: now_ms(),
            finished_at: None,
        }
    }

    pub(crate) fn advance(&mut self, next: LoadState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        self.state = next;
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(now_ms());
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.target.container_id
    }

    #[must_use]
    pub fn component_name(&self) -> &str {
        &self.target.component_name
    }
}

#[cfg(test)]
#[path = "attempt_test.rs"]
mod tests;
