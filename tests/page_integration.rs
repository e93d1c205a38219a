use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use mountguard::{
    ComponentDescriptor, ErrorKind, ErrorRecord, EventFilter, HostSignal, LoadState, MemoryHost,
    MountTarget, PageContext, PageManifest, Props, ViewNode, WidgetError,
};
use mountguard::diagnostics::PayloadType;
use serde_json::Value;

const DEMO_MANIFEST: &str = include_str!("../demos/page.json");

fn page() -> (Rc<MemoryHost>, PageContext, PageManifest) {
    let manifest = PageManifest::from_json(DEMO_MANIFEST).unwrap();
    let host = Rc::new(MemoryHost::with_containers(manifest.container_ids()));
    let page = PageContext::with_tokio(host.clone(), manifest.config.clone().unwrap_or_default());

    page.register(ComponentDescriptor::new("Greeting", |props: &Props| {
        let name = props.get("name").and_then(Value::as_str).unwrap_or("world");
        Ok(ViewNode::element("p").child(ViewNode::text(format!("Hello, {name}!"))))
    }))
    .unwrap();
    page.register(ComponentDescriptor::new("Counter", |props: &Props| {
        let start = props.get("start").and_then(Value::as_i64).unwrap_or(0);
        Ok(ViewNode::element("span").child(ViewNode::text(start.to_string())))
    }))
    .unwrap();
    page.register(ComponentDescriptor::new("Broken", |_| panic!("units table exploded"))).unwrap();
    page.register(ComponentDescriptor::new("Faulty", |_| Err(WidgetError::new("contacts unavailable"))))
        .unwrap();
    page.register(ComponentDescriptor::new("NeedsAuth", |_| Ok(ViewNode::text("in"))).requires(["auth"]))
        .unwrap();
    page.register(ComponentDescriptor::deferred("Stalled", |_| futures::future::pending())).unwrap();
    (host, page, manifest)
}

#[tokio::test(start_paused = true)]
async fn every_container_ends_with_widget_or_fallback() {
    let (host, page, manifest) = page();

    let outcomes = page.mount_manifest(&manifest).await;

    let states = manifest
        .targets
        .iter()
        .zip(&outcomes)
        .map(|(target, outcome)| (target.container_id.as_str(), outcome.state()))
        .collect::<Vec<_>>();
    assert_eq!(
        states,
        vec![
            ("welcome", Some(LoadState::Mounted)),
            ("clicks", Some(LoadState::Mounted)),
            ("units", Some(LoadState::FallenBack)),
            ("contacts", Some(LoadState::FallenBack)),
            ("history", Some(LoadState::FallenBack)),
            ("account", Some(LoadState::FallenBack)),
            ("report", Some(LoadState::FallenBack)),
        ]
    );
    for id in manifest.container_ids() {
        assert!(!host.html(id).is_empty(), "container {id} is blank");
    }

    assert_eq!(host.html("welcome"), "<p>Hello, Ada!</p>");
    assert!(host.html("units").contains("Central - 555-0100"));
    assert!(host.html("contacts").contains("reception: 555-0199"));
    assert!(host.html("report").contains("rows: 12"));
    assert!(host.html("history").contains("data-action=\"retry\""));

    let report = page.report();
    assert_eq!(report.mounted, 2);
    assert_eq!(report.fallen_back, 5);
    assert_eq!(report.errors_by_kind.get(&ErrorKind::RenderException), Some(&2));
    assert_eq!(report.errors_by_kind.get(&ErrorKind::MissingComponent), Some(&1));
    assert_eq!(report.errors_by_kind.get(&ErrorKind::MissingDependency), Some(&1));
    assert_eq!(report.errors_by_kind.get(&ErrorKind::Timeout), Some(&1));
    assert_eq!(report.components.len(), 6);
}

#[tokio::test(start_paused = true)]
async fn late_service_lets_a_retry_mount() {
    let (host, page, _) = page();
    let auth = page.services().flag("auth", false);

    let waiting = page.loader().load(MountTarget::new("account", "NeedsAuth"));
    let flip = async {
        tokio::time::sleep(Duration::from_millis(60)).await;
        auth.set(true);
    };
    let (outcome, ()) = futures::join!(waiting, flip);

    assert!(outcome.is_mounted());
    assert_eq!(host.html("account"), "in");
    let failed = page
        .diagnostics()
        .query(EventFilter::all().container("account").payload(PayloadType::Transition))
        .filter(|event| event.payload.state() == Some(LoadState::Failed))
        .count();
    assert_eq!(failed, 0);
}

#[tokio::test(start_paused = true)]
async fn sink_sees_errors_and_host_signals() {
    let (_host, page, _) = page();
    let seen = Rc::new(RefCell::new(Vec::<ErrorKind>::new()));
    let sink_seen = seen.clone();
    page.diagnostics()
        .set_sink(Some(Rc::new(move |record: &ErrorRecord| sink_seen.borrow_mut().push(record.kind))));

    page.loader().load(MountTarget::new("history", "Ghost")).await;
    page.diagnostics()
        .capture_host_signal(HostSignal::UnhandledRejection { reason: "csrf fetch failed".into() });

    assert_eq!(*seen.borrow(), vec![ErrorKind::MissingComponent, ErrorKind::ResourceLoadFailure]);
}
