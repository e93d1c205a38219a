use serde_json::json;

use super::*;

fn props(value: Value) -> Props {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn create_view_keeps_scalar_props_as_attributes() {
    let node = create_view(
        "div",
        &props(json!({ "class": "card", "data-count": 3, "hidden": false, "skip": null, "list": [1] })),
        vec![ViewNode::text("hi")],
    );
    assert_eq!(node.attribute("class"), Some("card"));
    assert_eq!(node.attribute("data-count"), Some("3"));
    assert_eq!(node.attribute("hidden"), Some("false"));
    assert_eq!(node.attribute("skip"), None);
    assert_eq!(node.attribute("list"), None);
    assert_eq!(node.text_content(), "hi");
}

#[test]
fn to_html_escapes_text_and_attributes() {
    let node = ViewNode::element("p")
        .attr("title", "a \"quoted\" <value>")
        .child(ViewNode::text("<script>alert('x')</script> & more"));
    assert_eq!(
        node.to_html(),
        "<p title=\"a &quot;quoted&quot; &lt;value&gt;\">&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; more</p>"
    );
}

#[test]
fn create_view_drops_unsafe_attribute_names() {
    let node = create_view(
        "div",
        &props(json!({
            "x\"><script>alert(1)</script><i a=\"": "v",
            "onmouseover": "alert(2)",
            "ONLOAD": "alert(3)",
            "data-id": "7",
            "aria-label": "ok",
        })),
        Vec::new(),
    );
    assert_eq!(node.to_html(), "<div aria-label=\"ok\" data-id=\"7\"></div>");
}

#[test]
fn invalid_tag_names_render_as_div() {
    let node = ViewNode::element("img src=x onerror=alert(3)").child(ViewNode::text("x"));
    assert_eq!(node.to_html(), "<div>x</div>");
    assert_eq!(create_view("p>", &Props::new(), Vec::new()).tag(), Some("div"));
}

#[test]
fn builder_skips_handler_attributes() {
    let node = ViewNode::element("button").attr("onclick", "steal()").attr("data-action", "retry");
    assert_eq!(node.attribute("onclick"), None);
    assert_eq!(node.to_html(), "<button data-action=\"retry\"></button>");
}

#[test]
fn deserialized_trees_are_checked_when_serialized() {
    let node: ViewNode = serde_json::from_value(json!({
        "type": "element",
        "tag": "svg onload=x",
        "attrs": { "onfocus": "x", "bad name": "y", "title": "t" },
        "children": [],
    }))
    .unwrap();
    assert_eq!(node.to_html(), "<div title=\"t\"></div>");
}

#[test]
fn name_validation() {
    assert!(is_valid_name("data-count"));
    assert!(is_valid_name("xlink:href"));
    assert!(is_valid_name("_x.y"));
    assert!(!is_valid_name(""));
    assert!(!is_valid_name("1a"));
    assert!(!is_valid_name("a b"));
    assert!(!is_safe_attribute("one-off"));
    assert!(is_safe_attribute("data-on"));
}

#[test]
fn to_html_orders_attributes_deterministically() {
    let node = ViewNode::element("a").attr("z", "1").attr("a", "2");
    assert_eq!(node.to_html(), "<a a=\"2\" z=\"1\"></a>");
}

#[test]
fn builders_ignore_text_nodes() {
    let node = ViewNode::text("plain").attr("class", "x").child(ViewNode::text("y"));
    assert_eq!(node, ViewNode::text("plain"));
    assert_eq!(node.tag(), None);
}

#[test]
fn blank_only_for_whitespace_text() {
    assert!(ViewNode::text("  \n").is_blank());
    assert!(!ViewNode::text("x").is_blank());
    assert!(!ViewNode::element("div").is_blank());
}

#[test]
fn find_by_class_matches_one_of_many_classes() {
    let node = ViewNode::element("div").child(
        ViewNode::element("section")
            .attr("class", "outer mg-notice")
            .child(ViewNode::text("inner")),
    );
    let found = node.find_by_class("mg-notice").map(ViewNode::text_content);
    assert_eq!(found.as_deref(), Some("inner"));
    assert!(node.find_by_class("mg").is_none());
}
