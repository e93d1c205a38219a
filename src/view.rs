//! Minimal view tree produced by widgets and fallbacks.
//!
//! SYSTEM CONTEXT
//! ==============
//! Widgets are opaque to the loader; the only thing it needs from them is a
//! `ViewNode` it can hand to a [`crate::host::RenderHost`]. Hosts that write
//! into a real document serialize with [`ViewNode::to_html`].
//!
//! Props are untrusted. Text and attribute values are escaped; tag and
//! attribute names must match `[A-Za-z_:][-A-Za-z0-9_:.]*` and `on*` handler
//! attributes are dropped. An invalid tag serializes as `div`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Widget props and view attributes share the JSON object shape.
pub type Props = serde_json::Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ViewNode {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
        children: Vec<ViewNode>,
    },
    Text {
        text: String,
    },
}

const FALLBACK_TAG: &str = "div";

/// Build an element node. Scalar props become attributes; `null`, arrays and
/// objects are skipped since they have no attribute form, as are keys that
/// fail [`is_safe_attribute`].
#[must_use]
pub fn create_view(tag: &str, props: &Props, children: Vec<ViewNode>) -> ViewNode {
    let attrs = props
        .iter()
        .filter(|(key, _)| is_safe_attribute(key))
        .filter_map(|(key, value)| attr_value(value).map(|v| (key.clone(), v)))
        .collect();
    ViewNode::Element { tag: safe_tag(tag).to_owned(), attrs, children }
}

/// XML-style name: `[A-Za-z_:][-A-Za-z0-9_:.]*`.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

/// A valid name that is not an inline event handler (`onclick`, `OnLoad`, ...).
#[must_use]
pub fn is_safe_attribute(name: &str) -> bool {
    is_valid_name(name) && !name.get(..2).is_some_and(|prefix| prefix.eq_ignore_ascii_case("on"))
}

fn safe_tag(tag: &str) -> &str {
    if is_valid_name(tag) { tag } else { FALLBACK_TAG }
}

fn attr_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl ViewNode {
    #[must_use]
    pub fn element(tag: &str) -> Self {
        Self::Element { tag: safe_tag(tag).to_owned(), attrs: BTreeMap::new(), children: Vec::new() }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Builder: set an attribute. No-op on text nodes and unsafe names.
    #[must_use]
    pub fn attr(mut self, key: &str, value: impl Into<String>) -> Self {
        if !is_safe_attribute(key) {
            return self;
        }
        if let Self::Element { attrs, .. } = &mut self {
            attrs.insert(key.to_owned(), value.into());
        }
        self
    }

    /// Builder: append a child. No-op on text nodes.
    #[must_use]
    pub fn child(mut self, node: ViewNode) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.push(node);
        }
        self
    }

    #[must_use]
    pub fn children(mut self, nodes: impl IntoIterator<Item = ViewNode>) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.extend(nodes);
        }
        self
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Element { tag, .. } => Some(tag),
            Self::Text { .. } => None,
        }
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        match self {
            Self::Element { attrs, .. } => attrs.get(key).map(String::as_str),
            Self::Text { .. } => None,
        }
    }

    /// Concatenated text of this node and all descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text { text } => out.push_str(text),
            Self::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Whether this node would produce no visible output.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text { text } => text.trim().is_empty(),
            Self::Element { .. } => false,
        }
    }

    /// Depth-first search for the first element carrying `class`.
    #[must_use]
    pub fn find_by_class(&self, class: &str) -> Option<&ViewNode> {
        match self {
            Self::Text { .. } => None,
            Self::Element { attrs, children, .. } => {
                let matches = attrs
                    .get("class")
                    .is_some_and(|c| c.split_whitespace().any(|part| part == class));
                if matches {
                    return Some(self);
                }
                children.iter().find_map(|c| c.find_by_class(class))
            }
        }
    }

    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Self::Text { text } => escape_into(text, out),
            Self::Element { tag, attrs, children } => {
                // Deserialized trees bypass the builders, so names are checked again here.
                let tag = safe_tag(tag);
                out.push('<');
                out.push_str(tag);
                for (key, value) in attrs.iter().filter(|(key, _)| is_safe_attribute(key)) {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    escape_into(value, out);
                    out.push('"');
                }
                out.push('>');
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn escape_into(raw: &str, out: &mut String) {
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
