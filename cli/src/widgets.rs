//! Built-in demo widgets, one per interesting load path.

use mountguard::{ComponentDescriptor, Props, ViewNode, WidgetError};
use serde_json::Value;

/// Name, required services, and what the widget does.
pub const CATALOG: &[(&str, &[&str], &str)] = &[
    ("Greeting", &[], "renders `Hello, <name>!`"),
    ("Counter", &[], "renders a counter starting at `start`"),
    ("Broken", &[], "panics while rendering"),
    ("Faulty", &[], "returns a render error"),
    ("Stalled", &[], "never finishes rendering"),
    ("NeedsAuth", &["auth"], "requires the `auth` service, which never becomes ready"),
];

#[must_use]
pub fn demo_widgets() -> Vec<ComponentDescriptor> {
    vec![
        ComponentDescriptor::new("Greeting", greeting),
        ComponentDescriptor::new("Counter", counter),
        ComponentDescriptor::new("Broken", |_| panic!("Broken widget always panics")),
        ComponentDescriptor::new("Faulty", |_| {
            Err(WidgetError::new("faulty widget refused to render").with_stack("at Faulty::render"))
        }),
        ComponentDescriptor::deferred("Stalled", |_| futures::future::pending()),
        ComponentDescriptor::new("NeedsAuth", |_| Ok(ViewNode::element("p").child(ViewNode::text("Signed in.")))).requires(["auth"]),
    ]
}

fn greeting(props: &Props) -> Result<ViewNode, WidgetError> {
    let name = props.get("name").and_then(Value::as_str).unwrap_or("world");
    Ok(ViewNode::element("p").attr("class", "greeting").child(ViewNode::text(format!("Hello, {name}!"))))
}

fn counter(props: &Props) -> Result<ViewNode, WidgetError> {
    let start = match props.get("start") {
        None => 0,
        Some(value) => value
            .as_i64()
            .ok_or_else(|| WidgetError::new(format!("`start` must be an integer, got {value}")))?,
    };
    Ok(ViewNode::element("div")
        .attr("class", "counter")
        .child(ViewNode::element("span").attr("class", "counter-value").child(ViewNode::text(start.to_string())))
        .child(ViewNode::element("button").attr("data-action", "increment").child(ViewNode::text("+"))))
}

#[cfg(test)]
#[path = "widgets_test.rs"]
mod tests;
