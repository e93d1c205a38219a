use super::*;

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn empty_requirements_are_ready() {
    let checker = DependencyChecker::new(Rc::new(ServiceDirectory::new()));
    assert_eq!(checker.check_ready(&BTreeSet::new()), Readiness::Ready);
}

#[test]
fn unregistered_service_is_missing() {
    let checker = DependencyChecker::new(Rc::new(ServiceDirectory::new()));
    assert_eq!(
        checker.check_ready(&set(&["auth"])),
        Readiness::NotReady { missing: set(&["auth"]) }
    );
}

#[test]
fn flag_flip_is_seen_on_next_check() {
    let services = Rc::new(ServiceDirectory::new());
    let auth = services.flag("auth", false);
    let checker = DependencyChecker::new(services);

    assert!(!checker.check_ready(&set(&["auth"])).is_ready());
    auth.set(true);
    assert!(checker.check_ready(&set(&["auth"])).is_ready());
}

#[test]
fn baseline_applies_to_every_check() {
    let services = Rc::new(ServiceDirectory::new());
    services.flag("auth", true);
    let renderer = services.flag("renderer", false);
    let checker = DependencyChecker::new(services).with_baseline(["renderer"]);

    assert_eq!(
        checker.check_ready(&set(&["auth"])),
        Readiness::NotReady { missing: set(&["renderer"]) }
    );
    renderer.set(true);
    assert_eq!(checker.check_ready(&set(&["auth"])), Readiness::Ready);
}

#[test]
fn check_is_idempotent() {
    let services = Rc::new(ServiceDirectory::new());
    services.flag("a", true);
    let checker = DependencyChecker::new(services);
    let required = set(&["a", "b"]);
    let first = checker.check_ready(&required);
    let second = checker.check_ready(&required);
    assert_eq!(first, second);
    assert_eq!(first, Readiness::NotReady { missing: set(&["b"]) });
}

#[test]
fn closure_probes_are_supported() {
    let services = Rc::new(ServiceDirectory::new());
    let counter = Rc::new(Cell::new(0u32));
    let seen = counter.clone();
    services.register(
        "lazy",
        Rc::new(move || {
            seen.set(seen.get() + 1);
            seen.get() > 2
        }),
    );
    assert!(!services.is_ready("lazy"));
    assert!(!services.is_ready("lazy"));
    assert!(services.is_ready("lazy"));
    assert_eq!(counter.get(), 3);
}

#[test]
fn remove_and_clear_forget_services() {
    let services = ServiceDirectory::new();
    services.flag("a", true);
    services.flag("b", true);
    services.remove("a");
    assert!(!services.is_ready("a"));
    assert_eq!(services.names(), vec!["b".to_owned()]);
    services.clear();
    assert!(services.names().is_empty());
}
