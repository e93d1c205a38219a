use serde_json::json;

use super::*;

fn props(value: Value) -> Props {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn catalog_matches_demo_widgets() {
    let names = demo_widgets().into_iter().map(|d| d.name).collect::<Vec<_>>();
    let catalog = CATALOG.iter().map(|(name, _, _)| (*name).to_owned()).collect::<Vec<_>>();
    assert_eq!(names, catalog);

    let needs_auth = demo_widgets().into_iter().find(|d| d.name == "NeedsAuth").unwrap();
    assert!(needs_auth.required_services.contains("auth"));
}

#[test]
fn greeting_uses_name_prop() {
    let view = greeting(&props(json!({ "name": "Ada" }))).unwrap();
    assert_eq!(view.text_content(), "Hello, Ada!");
    assert_eq!(greeting(&Props::new()).unwrap().text_content(), "Hello, world!");
}

#[test]
fn counter_rejects_non_integer_start() {
    let view = counter(&props(json!({ "start": 4 }))).unwrap();
    assert!(view.to_html().contains("<span class=\"counter-value\">4</span>"));

    let err = counter(&props(json!({ "start": "four" }))).unwrap_err();
    assert!(err.message.contains("must be an integer"));
}
