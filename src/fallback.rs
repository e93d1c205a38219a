//! Dependency-free static rendering used when the rich widget cannot be shown.
//!
//! The view is a pure function of the page's raw data snapshot. Missing or
//! unusable data never fails; it produces the "unavailable" notice with a
//! retry button instead. Mounting replaces container content, so rendering
//! the same fallback twice leaves one copy.

use std::rc::Rc;

use serde_json::Value;

use crate::config::LoaderConfig;
use crate::host::RenderHost;
use crate::view::ViewNode;

#[derive(Clone)]
pub struct StaticFallbackRenderer {
    host: Rc<dyn RenderHost>,
    fallback_message: String,
    unavailable_message: String,
}

impl StaticFallbackRenderer {
    #[must_use]
    pub fn new(host: Rc<dyn RenderHost>, config: &LoaderConfig) -> Self {
        Self {
            host,
            fallback_message: config.fallback_message.clone(),
            unavailable_message: config.unavailable_message.clone(),
        }
    }

    /// Render the fallback for `raw` into `container_id`. Never fails; a
    /// container the host cannot find is skipped.
    pub fn render_fallback(&self, container_id: &str, raw: Option<&Value>) {
        self.mount(container_id, None, raw);
    }

    /// Same as [`Self::render_fallback`], using `component` as the heading
    /// when the data carries no title.
    pub fn render_component_fallback(&self, container_id: &str, component: &str, raw: Option<&Value>) {
        self.mount(container_id, Some(component), raw);
    }

    #[must_use]
    pub fn view(&self, component: Option<&str>, raw: Option<&Value>) -> ViewNode {
        fallback_view(raw, component, &self.fallback_message, &self.unavailable_message)
    }

    fn mount(&self, container_id: &str, component: Option<&str>, raw: Option<&Value>) {
        let view = self.view(component, raw);
        if let Err(err) = self.host.mount(container_id, view) {
            tracing::warn!(container = %container_id, error = %err, "fallback not rendered");
        }
    }
}

impl std::fmt::Debug for StaticFallbackRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticFallbackRenderer")
            .field("fallback_message", &self.fallback_message)
            .field("unavailable_message", &self.unavailable_message)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// VIEW BUILDING
// =============================================================================

/// Build the static view for `raw`: a populated list when there is anything
/// to show, the unavailable notice otherwise.
#[must_use]
pub fn fallback_view(raw: Option<&Value>, component: Option<&str>, fallback_message: &str, unavailable_message: &str) -> ViewNode {
    let Some(Value::Object(data)) = raw else {
        return unavailable_view(component, unavailable_message);
    };

    let from_items = data
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(item_line).collect::<Vec<_>>())
        .filter(|lines| !lines.is_empty());
    let lines = from_items.unwrap_or_else(|| {
        data.iter()
            .filter(|(key, _)| key.as_str() != "title" && key.as_str() != "items")
            .filter_map(|(key, value)| field_text(value).map(|text| format!("{key}: {text}")))
            .collect()
    });
    if lines.is_empty() {
        return unavailable_view(component, unavailable_message);
    }

    let title = data.get("title").and_then(Value::as_str).or(component);
    let mut view = ViewNode::element("div").attr("class", "mg-fallback").attr("data-fallback", "static");
    if let Some(component) = component {
        view = view.attr("data-component", component);
    }
    view = view.child(
        ViewNode::element("div")
            .attr("class", "mg-fallback-warning")
            .attr("role", "status")
            .child(ViewNode::text(fallback_message)),
    );
    if let Some(title) = title {
        view = view.child(ViewNode::element("h3").child(ViewNode::text(title)));
    }
    view.child(
        ViewNode::element("ul")
            .attr("class", "mg-fallback-list")
            .children(lines.into_iter().map(|line| ViewNode::element("li").child(ViewNode::text(line)))),
    )
}

fn unavailable_view(component: Option<&str>, message: &str) -> ViewNode {
    let mut view = ViewNode::element("div").attr("class", "mg-fallback mg-unavailable");
    if let Some(component) = component {
        view = view.attr("data-component", component);
    }
    view.child(ViewNode::element("p").child(ViewNode::text(message))).child(
        ViewNode::element("button")
            .attr("type", "button")
            .attr("class", "mg-retry")
            .attr("data-action", "retry")
            .child(ViewNode::text("Retry")),
    )
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Scalars as-is; arrays of scalars joined; everything else skipped.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(values) => {
            let parts = values.iter().filter_map(scalar_text).collect::<Vec<_>>();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        other => scalar_text(other),
    }
}

/// A list item: a scalar, or an object's scalar fields joined.
fn item_line(item: &Value) -> Option<String> {
    match item {
        Value::Object(fields) => {
            let parts = fields.values().filter_map(scalar_text).collect::<Vec<_>>();
            (!parts.is_empty()).then(|| parts.join(" - "))
        }
        other => scalar_text(other),
    }
}

#[cfg(test)]
#[path = "fallback_test.rs"]
mod tests;
