use serde_json::json;

use super::*;

#[test]
fn happy_path_transitions_are_allowed() {
    let path = [
        LoadState::Pending,
        LoadState::DependenciesChecked,
        LoadState::Mounting,
        LoadState::Mounted,
    ];
    for pair in path.windows(2) {
        assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
    }
}

#[test]
fn terminal_states_have_no_exits() {
    for next in [
        LoadState::Pending,
        LoadState::DependenciesChecked,
        LoadState::Mounting,
        LoadState::Mounted,
        LoadState::Failed,
        LoadState::FallenBack,
    ] {
        assert!(!LoadState::Mounted.can_transition_to(next));
        assert!(!LoadState::FallenBack.can_transition_to(next));
    }
    assert!(LoadState::Mounted.is_terminal());
    assert!(LoadState::FallenBack.is_terminal());
    assert!(!LoadState::Failed.is_terminal());
}

#[test]
fn failed_may_fall_back_or_retry_mounting() {
    assert!(LoadState::Failed.can_transition_to(LoadState::FallenBack));
    assert!(LoadState::Failed.can_transition_to(LoadState::Mounting));
    assert!(!LoadState::Failed.can_transition_to(LoadState::Mounted));
    assert!(!LoadState::Pending.can_transition_to(LoadState::Mounting));
}

#[test]
fn retry_creates_new_record_in_same_cycle() {
    let cycle = Uuid::new_v4();
    let mut first = LoadAttempt::start(cycle, MountTarget::new("box", "Widget"));
    first.advance(LoadState::DependenciesChecked);
    first.advance(LoadState::Mounting);
    first.advance(LoadState::Failed);
    first.finish();

    let second = first.retry();
    assert_ne!(second.id, first.id);
    assert_eq!(second.cycle_id, cycle);
    assert_eq!(second.attempt_count, 2);
    assert_eq!(second.state, LoadState::Failed);
    assert!(!second.is_finished());
    assert!(first.is_finished());
}

#[test]
fn mount_target_deserializes_with_defaults() {
    let target: MountTarget = serde_json::from_value(json!({
        "container_id": "home",
        "component_name": "HomeReact"
    }))
    .unwrap();
    assert_eq!(target, MountTarget::new("home", "HomeReact"));

    let target: MountTarget = serde_json::from_value(json!({
        "container_id": "home",
        "component_name": "HomeReact",
        "props": { "user": "ana" },
        "fallback_data": { "title": "Home" }
    }))
    .unwrap();
    assert_eq!(target.props.get("user"), Some(&json!("ana")));
    assert_eq!(target.fallback_data, Some(json!({ "title": "Home" })));
}
