use super::*;

#[test]
fn new_containers_start_empty() {
    let host = MemoryHost::with_containers(["a", "b"]);
    assert!(host.has_container("a"));
    assert!(host.is_empty("a"));
    assert_eq!(host.html("b"), "");
    assert_eq!(host.container_ids(), vec!["a".to_owned(), "b".to_owned()]);
}

#[test]
fn mount_replaces_previous_content() {
    let host = MemoryHost::with_containers(["a"]);
    host.mount("a", ViewNode::element("p").child(ViewNode::text("one"))).unwrap();
    host.mount("a", ViewNode::element("p").child(ViewNode::text("two"))).unwrap();
    assert_eq!(host.html("a"), "<p>two</p>");
}

#[test]
fn mount_into_unknown_container_errors() {
    let host = MemoryHost::new();
    let err = host.mount("ghost", ViewNode::text("x")).unwrap_err();
    assert_eq!(err, HostError::ContainerNotFound("ghost".to_owned()));
    assert!(!host.has_container("ghost"));
}

#[test]
fn unmount_clears_and_ignores_unknown() {
    let host = MemoryHost::with_containers(["a"]);
    host.mount("a", ViewNode::text("x")).unwrap();
    host.unmount("a");
    host.unmount("missing");
    assert!(host.is_empty("a"));
    assert!(host.content("a").is_none());
}

#[test]
fn whitespace_text_counts_as_empty() {
    let host = MemoryHost::with_containers(["a"]);
    host.mount("a", ViewNode::text("   ")).unwrap();
    assert!(host.is_empty("a"));
}

#[test]
fn rejecting_container_refuses_mounts_until_accepted() {
    let host = MemoryHost::with_containers(["a"]);
    host.reject_mounts("a", "quota");
    assert!(matches!(host.mount("a", ViewNode::text("x")), Err(HostError::Rejected { .. })));
    host.accept_mounts("a");
    assert!(host.mount("a", ViewNode::text("x")).is_ok());
}

#[test]
fn add_container_keeps_existing_content() {
    let host = MemoryHost::with_containers(["a"]);
    host.mount("a", ViewNode::text("kept")).unwrap();
    host.add_container("a");
    assert_eq!(host.html("a"), "kept");
    host.remove_container("a");
    assert!(!host.has_container("a"));
}
