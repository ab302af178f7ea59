//! RPC method handler for the tabsound NDJSON protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches method calls to the coordinator
//! and dispatcher via the `App` struct.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::app::App;
use crate::types::command::AudioCommand;
use crate::types::tab::TabMetadata;

/// Dispatch a method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &Arc<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        // ─── Audio state ───
        "audio.tabs" => Ok(json!({"tabs": app.coordinator.snapshot()})),
        "audio.badge" => {
            let badge = app.coordinator.badge();
            Ok(json!({"text": badge.text, "color": badge.color}))
        }
        "audio.push" => {
            let tab_id = require_tab_id(params)?;
            // Policy: malformed pushes are dropped and logged, never
            // surfaced as an RPC failure. They just don't mutate state.
            match app.coordinator.handle_push(tab_id, params) {
                Ok(_) => Ok(json!({"accepted": true})),
                Err(e) => {
                    debug!("dropping malformed push from tab {}: {}", tab_id, e);
                    Ok(json!({"accepted": false}))
                }
            }
        }
        "audio.control" => {
            let tab_id = require_tab_id(params)?;
            let action = params
                .get("action")
                .and_then(Value::as_str)
                .ok_or("missing action")?;
            let command =
                AudioCommand::parse(action, params.get("value")).map_err(|e| e.to_string())?;
            match app.dispatcher.dispatch(tab_id, command).await {
                Ok(ack) => Ok(json!({"success": true, "action": ack.action})),
                Err(e) => Ok(json!({"success": false, "error": e.to_string()})),
            }
        }

        // ─── Tab lifecycle ───
        "tab.created" | "tab.loaded" => {
            let tab_id = require_tab_id(params)?;
            app.coordinator.tab_loaded(tab_id);
            Ok(json!({"ok": true}))
        }
        "tab.updated" => {
            let tab_id = require_tab_id(params)?;
            let meta = TabMetadata {
                title: params
                    .get("title")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                url: params.get("url").and_then(Value::as_str).map(str::to_string),
                icon_url: params
                    .get("icon_url")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            };
            app.coordinator.tab_metadata_updated(tab_id, &meta);
            Ok(json!({"ok": true}))
        }
        "tab.navigated" => {
            let tab_id = require_tab_id(params)?;
            let url = params.get("url").and_then(Value::as_str);
            app.coordinator.tab_navigated(tab_id, url);
            Ok(json!({"ok": true}))
        }
        "tab.closed" => {
            let tab_id = require_tab_id(params)?;
            let removed = app.coordinator.tab_closed(tab_id);
            Ok(json!({"ok": true, "removed": removed}))
        }
        "tab.audible" => {
            // The host audible flag flipped; poll this one tab immediately
            // instead of waiting for the next tick.
            let tab_id = require_tab_id(params)?.to_string();
            let poller = Arc::clone(&app.poller);
            tokio::spawn(async move {
                poller.poll_one(&tab_id).await;
            });
            Ok(json!({"ok": true}))
        }
        "agent.ready" => {
            let tab_id = require_tab_id(params)?;
            app.coordinator.agent_ready(tab_id);
            Ok(json!({"ok": true}))
        }

        // ─── Ping ───
        "ping" => Ok(json!({"pong": true})),

        _ => Err(format!("unknown method: {}", method)),
    }
}

fn require_tab_id(params: &Value) -> Result<&str, String> {
    params
        .get("tab_id")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing tab_id".to_string())
}
