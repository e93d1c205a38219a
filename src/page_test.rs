use std::cell::Cell;

use super::*;
use crate::error::ErrorKind;
use crate::host::MemoryHost;
use crate::loader::LoadState;
use crate::view::ViewNode;

const MANIFEST: &str = r#"{
    "targets": [
        { "container_id": "greeting", "component_name": "Greeting", "props": { "name": "Ada" } },
        { "container_id": "ghost", "component_name": "Ghost" }
    ],
    "data": { "ghost": { "title": "Cached", "status": "ok" } }
}"#;

/// Host whose rendering library can be switched off.
struct FlakyHost {
    inner: MemoryHost,
    ready: Cell<bool>,
}

impl RenderHost for FlakyHost {
    fn has_container(&self, container_id: &str) -> bool {
        self.inner.has_container(container_id)
    }

    fn is_empty(&self, container_id: &str) -> bool {
        self.inner.is_empty(container_id)
    }

    fn mount(&self, container_id: &str, node: ViewNode) -> Result<(), crate::error::HostError> {
        self.inner.mount(container_id, node)
    }

    fn unmount(&self, container_id: &str) {
        self.inner.unmount(container_id);
    }

    fn is_ready(&self) -> bool {
        self.ready.get()
    }
}

fn greeting() -> ComponentDescriptor {
    ComponentDescriptor::new("Greeting", |props| {
        let name = props.get("name").and_then(Value::as_str).unwrap_or("world");
        Ok(ViewNode::text(format!("Hello, {name}!")))
    })
}

#[test]
fn manifest_parses_targets_and_data() {
    let manifest = PageManifest::from_json(MANIFEST).unwrap();
    assert_eq!(manifest.container_ids(), vec!["greeting", "ghost"]);
    assert_eq!(manifest.targets[0].props["name"], "Ada");
    assert!(manifest.config.is_none());
}

#[test]
fn manifest_rejects_duplicate_containers() {
    let raw = r#"{ "targets": [
        { "container_id": "a", "component_name": "X" },
        { "container_id": "a", "component_name": "Y" }
    ] }"#;
    let err = PageManifest::from_json(raw).unwrap_err();
    assert!(matches!(err, ManifestError::DuplicateContainer(ref id) if id == "a"));
}

#[test]
fn manifest_rejects_empty_component_and_bad_config() {
    let raw = r#"{ "targets": [{ "container_id": "a", "component_name": " " }] }"#;
    assert!(matches!(PageManifest::from_json(raw), Err(ManifestError::EmptyComponent(_))));

    let raw = r#"{ "targets": [], "config": { "mount_timeout_ms": 0 } }"#;
    assert!(matches!(PageManifest::from_json(raw), Err(ManifestError::Config(_))));

    assert!(matches!(PageManifest::from_json("{"), Err(ManifestError::Parse(_))));
}

#[tokio::test(start_paused = true)]
async fn mount_manifest_loads_every_target() {
    let host = Rc::new(MemoryHost::with_containers(["greeting", "ghost"]));
    let page = PageContext::with_tokio(host.clone(), LoaderConfig::default());
    page.register(greeting()).unwrap();

    let manifest = PageManifest::from_json(MANIFEST).unwrap();
    let outcomes = page.mount_manifest(&manifest).await;

    assert!(outcomes[0].is_mounted());
    assert_eq!(outcomes[1].state(), Some(LoadState::FallenBack));
    assert_eq!(host.html("greeting"), "Hello, Ada!");
    assert!(host.html("ghost").contains("status: ok"));

    let report = page.report();
    assert_eq!(report.mounted, 1);
    assert_eq!(report.fallen_back, 1);
    assert_eq!(report.errors_by_kind.get(&ErrorKind::MissingComponent), Some(&1));
    assert_eq!(report.components, vec!["Greeting".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn mount_manifest_runs_as_a_detached_local_task() {
    let host = Rc::new(MemoryHost::with_containers(["greeting", "ghost"]));
    let page = PageContext::with_tokio(host.clone(), LoaderConfig::default());
    page.register(greeting()).unwrap();
    let manifest = PageManifest::from_json(MANIFEST).unwrap();

    let local = tokio::task::LocalSet::new();
    let mounted = local
        .run_until(async move {
            tokio::task::spawn_local(async move {
                let outcomes = page.mount_manifest(&manifest).await;
                outcomes.iter().filter(|outcome| outcome.is_mounted()).count()
            })
            .await
            .unwrap()
        })
        .await;

    assert_eq!(mounted, 1);
    assert_eq!(host.html("greeting"), "Hello, Ada!");
    assert!(!host.html("ghost").is_empty());
}

#[test]
fn register_rejects_second_descriptor_with_same_name() {
    let page = PageContext::with_tokio(Rc::new(MemoryHost::new()), LoaderConfig::default());
    page.register(greeting()).unwrap();
    assert!(page.register(greeting()).is_err());
    assert_eq!(page.registry().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn renderer_readiness_gates_mounting() {
    let host = Rc::new(FlakyHost { inner: MemoryHost::with_containers(["greeting"]), ready: Cell::new(false) });
    let config = LoaderConfig {
        dependency: crate::config::BackoffConfig { max_retries: 1, ..Default::default() },
        ..LoaderConfig::default()
    };
    let page = PageContext::with_tokio(host.clone(), config);
    page.register(greeting()).unwrap();
    let target = MountTarget::new("greeting", "Greeting");

    let outcome = page.loader().load(target.clone()).await;
    let error = outcome.attempt().and_then(|a| a.error.clone()).unwrap();
    assert_eq!(error.kind, ErrorKind::MissingDependency);
    assert!(error.message.contains(RENDERER_SERVICE));

    host.ready.set(true);
    assert!(page.loader().load(target).await.is_mounted());
}

#[tokio::test(start_paused = true)]
async fn teardown_ends_the_page_lifetime() {
    let host = Rc::new(MemoryHost::with_containers(["greeting", "ghost"]));
    let page = PageContext::with_tokio(host.clone(), LoaderConfig::default());
    page.register(greeting()).unwrap();
    page.mount_manifest(&PageManifest::from_json(MANIFEST).unwrap()).await;

    page.teardown();

    assert!(host.content("greeting").is_none());
    assert!(host.content("ghost").is_none());
    assert!(page.registry().is_empty());
    assert!(page.diagnostics().is_empty());
    assert!(page.loader().containers().is_empty());
    assert_eq!(page.loader().page_data(), None);
}
