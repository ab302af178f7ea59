//! Unit tests for the RPC handler — the method surface consumed by host
//! glue and UI clients, exercised through the same code path as the real
//! `tabsound-rpc` binary.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use tabsound::app::App;
use tabsound::rpc_handler::handle_method;
use tabsound::services::badge::Badge;
use tabsound::services::host::TabHost;
use tabsound::services::remote_agent::RemoteAgent;
use tabsound::types::command::AudioCommand;
use tabsound::types::config::CoordinatorConfig;
use tabsound::types::errors::{AgentError, HostError};
use tabsound::types::signal::AudioStateReport;
use tabsound::types::tab::TabMetadata;

#[derive(Default)]
struct FakeHost {
    metadata: Mutex<HashMap<String, TabMetadata>>,
    injections: Mutex<Vec<String>>,
}

impl TabHost for FakeHost {
    fn list_tabs(&self) -> Vec<String> {
        self.metadata.lock().unwrap().keys().cloned().collect()
    }

    fn audible_hint(&self, _tab_id: &str) -> Option<bool> {
        None
    }

    fn tab_metadata(&self, tab_id: &str) -> Option<TabMetadata> {
        self.metadata.lock().unwrap().get(tab_id).cloned()
    }

    fn set_badge(&self, _badge: &Badge) -> Result<(), HostError> {
        Ok(())
    }

    fn request_agent_injection(&self, tab_id: &str) -> Result<(), HostError> {
        self.injections.lock().unwrap().push(tab_id.to_string());
        Ok(())
    }
}

struct FakeAgent;

#[async_trait]
impl RemoteAgent for FakeAgent {
    async fn query(&self, tab_id: &str) -> Result<AudioStateReport, AgentError> {
        Err(AgentError::Unavailable(tab_id.to_string()))
    }

    async fn execute(&self, tab_id: &str, _command: &AudioCommand) -> Result<(), AgentError> {
        if tab_id == "unreachable" {
            Err(AgentError::Unavailable(tab_id.to_string()))
        } else {
            Ok(())
        }
    }

    async fn secondary_mute_state(&self, _tab_id: &str) -> Result<Option<bool>, AgentError> {
        Ok(None)
    }

    async fn toggle_secondary_mute(&self, _tab_id: &str) -> Result<(), AgentError> {
        Ok(())
    }
}

fn setup() -> (Arc<App>, Arc<FakeHost>) {
    let host = Arc::new(FakeHost::default());
    let app = Arc::new(App::new(
        host.clone(),
        Arc::new(FakeAgent),
        CoordinatorConfig::default(),
    ));
    (app, host)
}

// ─── Ping ───

#[tokio::test]
async fn test_ping() {
    let (app, _host) = setup();
    let res = handle_method(&app, "ping", &json!({})).await.unwrap();
    assert_eq!(res, json!({"pong": true}));
}

// ─── Unknown method ───

#[tokio::test]
async fn test_unknown_method_returns_error() {
    let (app, _host) = setup();
    let res = handle_method(&app, "nonexistent.method", &json!({})).await;
    assert!(res.is_err());
    assert!(res.unwrap_err().contains("unknown method"));
}

// ─── Audio state ───

#[tokio::test]
async fn test_audio_tabs_empty_then_populated() {
    let (app, _host) = setup();

    let res = handle_method(&app, "audio.tabs", &json!({})).await.unwrap();
    assert_eq!(res["tabs"].as_array().unwrap().len(), 0);

    handle_method(
        &app,
        "audio.push",
        &json!({"tab_id": "5", "playing": true, "volume": 0.7, "muted": false}),
    )
    .await
    .unwrap();

    let res = handle_method(&app, "audio.tabs", &json!({})).await.unwrap();
    let tabs = res["tabs"].as_array().unwrap();
    assert_eq!(tabs.len(), 1);
    assert_eq!(tabs[0]["tab_id"], "5");
    assert_eq!(tabs[0]["volume"], 0.7);
}

#[tokio::test]
async fn test_push_requires_tab_id() {
    let (app, _host) = setup();
    let res = handle_method(&app, "audio.push", &json!({"playing": true})).await;
    assert_eq!(res.unwrap_err(), "missing tab_id");
}

#[tokio::test]
async fn test_malformed_push_dropped_without_error() {
    let (app, _host) = setup();

    // Schema violation: accepted:false, no RPC error, no state change.
    let res = handle_method(&app, "audio.push", &json!({"tab_id": "5", "playing": "loud"}))
        .await
        .unwrap();
    assert_eq!(res, json!({"accepted": false}));
    assert_eq!(app.coordinator.size(), 0);
}

#[tokio::test]
async fn test_badge_follows_registry() {
    let (app, _host) = setup();

    let res = handle_method(&app, "audio.badge", &json!({})).await.unwrap();
    assert_eq!(res["text"], "");

    handle_method(&app, "audio.push", &json!({"tab_id": "5", "playing": true}))
        .await
        .unwrap();
    let res = handle_method(&app, "audio.badge", &json!({})).await.unwrap();
    assert_eq!(res["text"], "1");
    assert_eq!(res["color"], "#4CAF50");
}

// ─── Commands ───

#[tokio::test]
async fn test_control_success() {
    let (app, _host) = setup();
    handle_method(&app, "audio.push", &json!({"tab_id": "5", "playing": true}))
        .await
        .unwrap();

    let res = handle_method(
        &app,
        "audio.control",
        &json!({"tab_id": "5", "action": "setVolume", "value": 0.5}),
    )
    .await
    .unwrap();
    assert_eq!(res["success"], true);
    assert_eq!(app.coordinator.get("5").unwrap().volume, 0.5);
}

#[tokio::test]
async fn test_control_failure_reported_in_result() {
    let (app, _host) = setup();

    // Agent failures are part of the response contract, not RPC errors.
    let res = handle_method(
        &app,
        "audio.control",
        &json!({"tab_id": "unreachable", "action": "pause"}),
    )
    .await
    .unwrap();
    assert_eq!(res["success"], false);
    assert!(res["error"].as_str().unwrap().contains("unreachable"));
}

#[tokio::test]
async fn test_control_rejects_unknown_action() {
    let (app, _host) = setup();
    let res = handle_method(
        &app,
        "audio.control",
        &json!({"tab_id": "5", "action": "explode"}),
    )
    .await;
    assert!(res.unwrap_err().contains("Unknown action"));
}

#[tokio::test]
async fn test_control_requires_value_for_set_volume() {
    let (app, _host) = setup();
    let res = handle_method(
        &app,
        "audio.control",
        &json!({"tab_id": "5", "action": "setVolume"}),
    )
    .await;
    assert!(res.is_err());
}

// ─── Tab lifecycle ───

#[tokio::test]
async fn test_tab_closed_removes_and_blanks_badge() {
    let (app, _host) = setup();
    handle_method(&app, "audio.push", &json!({"tab_id": "5", "playing": true, "muted": true}))
        .await
        .unwrap();

    let res = handle_method(&app, "tab.closed", &json!({"tab_id": "5"}))
        .await
        .unwrap();
    assert_eq!(res["removed"], true);
    assert_eq!(app.coordinator.size(), 0);

    let badge = handle_method(&app, "audio.badge", &json!({})).await.unwrap();
    assert_eq!(badge["text"], "");
}

#[tokio::test]
async fn test_tab_loaded_triggers_injection() {
    let (app, host) = setup();
    handle_method(&app, "tab.loaded", &json!({"tab_id": "5"}))
        .await
        .unwrap();
    assert_eq!(host.injections.lock().unwrap().as_slice(), ["5"]);
}

#[tokio::test]
async fn test_tab_updated_refreshes_metadata() {
    let (app, _host) = setup();
    handle_method(&app, "audio.push", &json!({"tab_id": "5", "playing": true}))
        .await
        .unwrap();

    handle_method(
        &app,
        "tab.updated",
        &json!({"tab_id": "5", "title": "New title", "icon_url": "icon.png"}),
    )
    .await
    .unwrap();

    let entry = app.coordinator.get("5").unwrap();
    assert_eq!(entry.title, "New title");
    assert_eq!(entry.icon_url.as_deref(), Some("icon.png"));
}

#[tokio::test]
async fn test_tab_navigated_then_agent_ready() {
    let (app, _host) = setup();

    handle_method(&app, "tab.navigated", &json!({"tab_id": "5", "url": "https://b.example"}))
        .await
        .unwrap();
    assert!(!app.coordinator.agent_reachable("5"));

    handle_method(&app, "agent.ready", &json!({"tab_id": "5"}))
        .await
        .unwrap();
    assert!(app.coordinator.agent_reachable("5"));
}

#[tokio::test]
async fn test_tab_audible_acknowledged() {
    let (app, _host) = setup();
    let res = handle_method(&app, "tab.audible", &json!({"tab_id": "5"}))
        .await
        .unwrap();
    assert_eq!(res, json!({"ok": true}));
}
