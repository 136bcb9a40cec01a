use std::fs;

use jobwatch_app::platform::persistence::{ClientState, StateStore};
use jobwatch_core::Theme;
use tempfile::tempdir;

#[test]
fn missing_file_loads_defaults() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.ron"));
    assert_eq!(store.load(), ClientState::default());
    assert_eq!(store.load().theme(), Theme::Dark);
}

#[test]
fn remember_helpers_update_one_field_each() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("nested").join("state.ron"));

    store.remember_job(Some("j42".to_string()));
    store.remember_scenario("scenario-7".to_string());
    store.remember_theme(Theme::Light);

    let state = store.load();
    assert_eq!(state.last_job_id.as_deref(), Some("j42"));
    assert_eq!(state.scenario_id.as_deref(), Some("scenario-7"));
    assert_eq!(state.theme(), Theme::Light);

    store.remember_job(None);
    let state = store.load();
    assert_eq!(state.last_job_id, None);
    assert_eq!(state.scenario_id.as_deref(), Some("scenario-7"));
}

#[test]
fn corrupt_file_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.ron");
    fs::write(&path, "not ron at all {").unwrap();

    let store = StateStore::new(path);
    assert_eq!(store.load(), ClientState::default());
}

#[test]
fn unknown_theme_uses_default() {
    let state = ClientState {
        theme: Some("sepia".to_string()),
        ..ClientState::default()
    };
    assert_eq!(state.theme(), Theme::Dark);
}

#[test]
fn partial_file_keeps_missing_fields_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.ron");
    fs::write(&path, r#"(last_job_id: Some("j1"))"#).unwrap();

    let state = StateStore::new(path).load();
    assert_eq!(state.last_job_id.as_deref(), Some("j1"));
    assert_eq!(state.scenario_id, None);
}
