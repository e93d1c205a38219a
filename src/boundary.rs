//! Per-widget error containment.
//!
//! DESIGN
//! ======
//! The boundary is the single place where a widget's render failure is turned
//! into an `ErrorRecord`. A widget can fail two ways: return `Err(WidgetError)`,
//! or panic, either in the synchronous call that builds its render future or
//! while that future is polled. Both panics are caught here with
//! `catch_unwind` and never reach the host page.
//!
//! Each failure is recorded to diagnostics exactly once, as `RenderException`
//! attributed to the wrapped component. Callers branch on the returned
//! `Result` and must not record the same failure again.
//!
//! TRADE-OFFS
//! ==========
//! On `wasm32` builds compiled with `panic = "abort"` only `WidgetError`
//! returns are contained; a panic still aborts the module. Errors raised from
//! event handlers after a successful render are the widget's own business.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use futures::FutureExt;

use crate::diagnostics::Diagnostics;
use crate::error::{ErrorKind, ErrorRecord, WidgetError};
use crate::registry::ComponentDescriptor;
use crate::view::{Props, ViewNode};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BoundaryState {
    #[default]
    Healthy,
    /// Showing the inline notice in place of the widget.
    Errored(ErrorRecord),
}

#[derive(Clone, Debug)]
pub struct ErrorBoundary {
    component: String,
    container_id: Option<String>,
    state: BoundaryState,
    diagnostics: Diagnostics,
}

impl ErrorBoundary {
    #[must_use]
    pub fn new(component: impl Into<String>, diagnostics: Diagnostics) -> Self {
        Self { component: component.into(), container_id: None, state: BoundaryState::Healthy, diagnostics }
    }

    #[must_use]
    pub fn with_container(mut self, container_id: impl Into<String>) -> Self {
        self.container_id = Some(container_id.into());
        self
    }

    /// Run one render or update of the wrapped widget.
    ///
    /// # Errors
    ///
    /// Returns the `RenderException` record (already stored in diagnostics)
    /// when the widget returned an error or panicked.
    pub async fn render(&mut self, descriptor: &ComponentDescriptor, props: &Props) -> Result<ViewNode, ErrorRecord> {
        let render = descriptor.render.clone();
        let result = match catch_unwind(AssertUnwindSafe(|| render(props))) {
            Ok(future) => match AssertUnwindSafe(future).catch_unwind().await {
                Ok(result) => result.map_err(|err| self.widget_error(err)),
                Err(payload) => Err(self.panic_error(payload.as_ref())),
            },
            Err(payload) => Err(self.panic_error(payload.as_ref())),
        };

        match result {
            Ok(view) => {
                self.state = BoundaryState::Healthy;
                Ok(view)
            }
            Err(record) => {
                self.diagnostics.record_error(self.container_id.as_deref(), record.clone());
                self.state = BoundaryState::Errored(record.clone());
                Err(record)
            }
        }
    }

    /// Inline notice shown in place of a widget that failed after mounting.
    #[must_use]
    pub fn notice_view(&self) -> ViewNode {
        let mut notice = ViewNode::element("div")
            .attr("class", "mg-boundary-notice")
            .attr("role", "alert")
            .attr("data-component", self.component.as_str())
            .child(ViewNode::element("p").child(ViewNode::text("Something went wrong while displaying this section.")));
        if let BoundaryState::Errored(record) = &self.state {
            let mut details = ViewNode::element("details")
                .child(ViewNode::element("summary").child(ViewNode::text("Details")))
                .child(ViewNode::element("pre").child(ViewNode::text(record.message.as_str())));
            if let Some(stack) = &record.stack {
                details = details.child(ViewNode::element("pre").attr("class", "mg-stack").child(ViewNode::text(stack.as_str())));
            }
            notice = notice.child(details);
        }
        notice
    }

    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    #[must_use]
    pub fn state(&self) -> &BoundaryState {
        &self.state
    }

    #[must_use]
    pub fn is_errored(&self) -> bool {
        matches!(self.state, BoundaryState::Errored(_))
    }

    /// Back to `Healthy`; the next `render` tries the widget again.
    pub fn reset(&mut self) {
        self.state = BoundaryState::Healthy;
    }

    fn widget_error(&self, err: WidgetError) -> ErrorRecord {
        ErrorRecord::new(ErrorKind::RenderException, err.message)
            .with_component(self.component.as_str())
            .with_stack(err.stack)
    }

    fn panic_error(&self, payload: &(dyn Any + Send)) -> ErrorRecord {
        ErrorRecord::new(ErrorKind::RenderException, panic_message(payload)).with_component(self.component.as_str())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
#[path = "boundary_test.rs"]
mod tests;
