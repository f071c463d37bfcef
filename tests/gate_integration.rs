//! Initialization gate integration tests
//!
//! Drives the public hook entry point and marker store the way the host does:
//! one JSON event per call, state shared only through marker files.

use std::fs::File;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fs2::FileExt;

use serena_hooks::config::Config;
use serena_hooks::domain::{ActivationRecord, HookEvent, InitStep, StepState};
use serena_hooks::error::HookError;
use serena_hooks::gate::{Gate, UNVERIFIED_NOTICE};
use serena_hooks::hooks::{self, HookKind};
use serena_hooks::storage::MarkerStore;
use tempfile::TempDir;

fn test_config(temp: &TempDir) -> Config {
    let mut config = Config::default();
    config.bypass_env = "SERENA_HOOKS_TEST_NEVER_SET".to_string();
    config.marker.dir = temp.path().to_path_buf();
    config.marker.lock_retry_ms = 1;
    config.gate.require_git_repo = false;
    config
}

fn run_gate(config: &Config, event: &str) -> (u8, serde_json::Value) {
    let mut output = Vec::new();
    let code = hooks::run(HookKind::Gate, config, event.as_bytes(), &mut output);
    let response = serde_json::from_slice(&output).expect("response is JSON");
    (code, response)
}

const EDIT_FILE: &str = r#"{"hook_event_name": "PreToolUse", "tool_name": "edit_file", "session_id": "sess-1"}"#;

/// No marker file exists: the event is blocked with an activation instruction
#[test]
fn test_no_marker_blocks_with_instruction() {
    let temp = TempDir::new().unwrap();
    let config = test_config(&temp);

    let (code, response) = run_gate(&config, EDIT_FILE);
    assert_eq!(code, 2);
    let message = response["systemMessage"].as_str().unwrap();
    assert!(message.starts_with("Tool blocked. Still need to call:"));
    assert!(message.contains("activate_project"));
}

/// Marker says activated: the event proceeds unmodified
#[test]
fn test_activated_marker_allows() {
    let temp = TempDir::new().unwrap();
    let config = test_config(&temp);
    MarkerStore::from_config(&config.marker)
        .update("sess-1", |r| *r = ActivationRecord::fully_activated())
        .unwrap();

    let (code, response) = run_gate(&config, EDIT_FILE);
    assert_eq!(code, 0);
    assert_eq!(response, serde_json::json!({}));
}

/// Marker cannot be read: fail closed without crashing
#[test]
fn test_unreadable_marker_fails_closed() {
    let temp = TempDir::new().unwrap();
    let config = test_config(&temp);
    let store = MarkerStore::from_config(&config.marker);
    std::fs::create_dir(store.path("sess-1")).unwrap();

    let (code, response) = run_gate(&config, EDIT_FILE);
    assert_eq!(code, 2);
    assert_eq!(response["systemMessage"], UNVERIFIED_NOTICE);
}

/// Marker without read permission: fail closed without crashing
#[cfg(unix)]
#[test]
fn test_permission_denied_marker_fails_closed() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let config = test_config(&temp);
    let store = MarkerStore::from_config(&config.marker);
    store
        .update("sess-1", |r| *r = ActivationRecord::fully_activated())
        .unwrap();
    let path = store.path("sess-1");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();

    // root ignores file modes, nothing to check there
    if File::open(&path).is_ok() {
        return;
    }

    let (code, response) = run_gate(&config, EDIT_FILE);
    assert_eq!(code, 2);
    assert_eq!(response["systemMessage"], UNVERIFIED_NOTICE);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
}

/// Another process holds the marker lock through the retry: fail closed
#[test]
fn test_contended_marker_fails_closed() {
    let temp = TempDir::new().unwrap();
    let config = test_config(&temp);
    let store = MarkerStore::from_config(&config.marker);
    store
        .update("sess-1", |r| *r = ActivationRecord::fully_activated())
        .unwrap();

    let holder = File::open(store.path("sess-1")).unwrap();
    FileExt::lock_exclusive(&holder).unwrap();

    let (code, response) = run_gate(&config, EDIT_FILE);
    assert_eq!(code, 2);
    assert_eq!(response["systemMessage"], UNVERIFIED_NOTICE);

    FileExt::unlock(&holder).unwrap();
    let (code, _) = run_gate(&config, EDIT_FILE);
    assert_eq!(code, 0);
}

/// Corrupt marker content is treated like an unreadable marker
#[test]
fn test_corrupt_marker_fails_closed() {
    let temp = TempDir::new().unwrap();
    let config = test_config(&temp);
    let store = MarkerStore::from_config(&config.marker);
    std::fs::write(store.path("sess-1"), "{\"activate_project\": ").unwrap();

    let (code, _) = run_gate(&config, EDIT_FILE);
    assert_eq!(code, 2);
}

/// Repeating the same event under the same marker state gives the same result
#[test]
fn test_repeated_events_are_idempotent() {
    let temp = TempDir::new().unwrap();
    let config = test_config(&temp);

    let first = run_gate(&config, EDIT_FILE);
    let second = run_gate(&config, EDIT_FILE);
    assert_eq!(first, second);

    MarkerStore::from_config(&config.marker)
        .update("sess-1", |r| *r = ActivationRecord::fully_activated())
        .unwrap();
    let third = run_gate(&config, EDIT_FILE);
    let fourth = run_gate(&config, EDIT_FILE);
    assert_eq!(third, fourth);
    assert_eq!(third.0, 0);
}

/// The gate never writes the marker while deciding an ordinary tool call
#[test]
fn test_decision_does_not_mutate_marker() {
    let temp = TempDir::new().unwrap();
    let config = test_config(&temp);
    let store = MarkerStore::from_config(&config.marker);

    run_gate(&config, EDIT_FILE);
    assert!(!store.path("sess-1").exists());

    let mut record = ActivationRecord::default();
    record.set(InitStep::ActivateProject, StepState::Done);
    store.update("sess-1", |r| *r = record.clone()).unwrap();
    run_gate(&config, EDIT_FILE);
    assert_eq!(store.load("sess-1").unwrap(), record);
}

/// Full activation through hook events, as the host would send them
#[test]
fn test_activation_through_hook_events() {
    let temp = TempDir::new().unwrap();
    let config = test_config(&temp);
    let tools = [
        ("mcp__plugin_serena_serena__activate_project", "{}"),
        ("mcp__plugin_serena_serena__initial_instructions", "{}"),
        ("mcp__plugin_serena_serena__read_memory", r#"{"memory_name": "critical_behaviors"}"#),
    ];

    for (tool, input) in tools {
        for phase in ["PreToolUse", "PostToolUse"] {
            let event = format!(
                r#"{{"hook_event_name": "{}", "tool_name": "{}", "tool_input": {}, "session_id": "sess-1"}}"#,
                phase, tool, input
            );
            let (code, _) = run_gate(&config, &event);
            assert_eq!(code, 0);
        }
    }

    let (code, _) = run_gate(&config, EDIT_FILE);
    assert_eq!(code, 0);
}

fn activate_session(config: &Config, session: &str) {
    let tools = [
        ("mcp__plugin_serena_serena__activate_project", "{}"),
        ("mcp__plugin_serena_serena__initial_instructions", "{}"),
        ("mcp__plugin_serena_serena__read_memory", r#"{"memory_name": "critical_behaviors"}"#),
    ];
    for (tool, input) in tools {
        let event = serde_json::json!({
            "hook_event_name": "PreToolUse",
            "tool_name": tool,
            "tool_input": serde_json::from_str::<serde_json::Value>(input).unwrap(),
            "session_id": session,
        });
        run_gate(config, &event.to_string());
    }
}

fn edit_file_in(session: &str) -> String {
    serde_json::json!({
        "hook_event_name": "PreToolUse",
        "tool_name": "edit_file",
        "session_id": session,
    })
    .to_string()
}

/// An empty session id has no marker: init calls write nothing and the gate stays shut
#[test]
fn test_empty_session_id_never_activates() {
    let temp = TempDir::new().unwrap();
    let config = test_config(&temp);

    activate_session(&config, "");

    let (code, _) = run_gate(&config, &edit_file_in(""));
    assert_eq!(code, 2);
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

/// Session ids that differ only in escaped characters keep separate markers
#[test]
fn test_similar_session_ids_do_not_share_activation() {
    let temp = TempDir::new().unwrap();
    let config = test_config(&temp);

    activate_session(&config, "a/b");

    let (code, _) = run_gate(&config, &edit_file_in("a/b"));
    assert_eq!(code, 0);
    let (code, _) = run_gate(&config, &edit_file_in("a_b"));
    assert_eq!(code, 2);
}

/// Concurrent writers and readers: readers only ever see complete records
#[test]
fn test_concurrent_activation_has_no_torn_reads() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(MarkerStore::new(temp.path(), ".serena-session-", Duration::from_millis(1)));
    let long_project = "p".repeat(4096);

    let writers: Vec<_> = InitStep::ALL
        .into_iter()
        .map(|step| {
            let store = Arc::clone(&store);
            let project = long_project.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    store
                        .update("sess-1", |r| {
                            r.set(step, StepState::Done);
                            r.project = if i % 2 == 0 { Some(project.clone()) } else { None };
                        })
                        .unwrap();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    match store.load("sess-1") {
                        Ok(_) | Err(HookError::MarkerLockContention(_)) => {}
                        Err(e) => panic!("Torn or unreadable marker: {}", e),
                    }
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    let record = store.load("sess-1").unwrap();
    assert!(record.is_activated(&InitStep::ALL));
}

/// Once an activation write completes, every reader agrees on it
#[test]
fn test_readers_agree_after_completed_write() {
    let temp = TempDir::new().unwrap();
    let mut config = test_config(&temp);
    config.gate.required_steps = vec![InitStep::ActivateProject];
    let gate = Arc::new(Gate::from_config(&config));

    gate.store()
        .update("sess-1", |r| r.set(InitStep::ActivateProject, StepState::Done))
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let event = HookEvent::pre_tool_use("edit_file").with_session("sess-1");
                gate.handle(&event).is_block()
            })
        })
        .collect();

    for handle in handles {
        assert!(!handle.join().unwrap());
    }
}
