//! Host bridge over the NDJSON stdio protocol.
//!
//! Outgoing traffic (agent requests, badge updates, injection requests) is
//! written as single-line JSON events. Agent requests carry a generated
//! `request_id`; the host glue answers with an `agent.response` line, which
//! the server routes back here to resolve the pending call.
//!
//! The bridge also mirrors the host's tab table (id, title, url, icon,
//! audible flag), fed by the `tab.*` lifecycle messages, so the audible
//! hint and metadata lookups are synchronous.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::debug;
use uuid::Uuid;

use crate::services::badge::Badge;
use crate::services::host::TabHost;
use crate::services::remote_agent::RemoteAgent;
use crate::types::command::AudioCommand;
use crate::types::errors::{AgentError, HostError};
use crate::types::signal::AudioStateReport;
use crate::types::tab::TabMetadata;

/// One row of the mirrored host tab table.
#[derive(Debug, Clone, Default)]
struct HostTab {
    title: Option<String>,
    url: Option<String>,
    icon_url: Option<String>,
    audible: bool,
}

pub struct StdioBridge {
    out: mpsc::UnboundedSender<String>,
    pending: Mutex<HashMap<String, oneshot::Sender<Value>>>,
    tabs: Mutex<HashMap<String, HostTab>>,
    request_timeout: Duration,
}

impl StdioBridge {
    pub fn new(out: mpsc::UnboundedSender<String>, request_timeout: Duration) -> Self {
        Self {
            out,
            pending: Mutex::new(HashMap::new()),
            tabs: Mutex::new(HashMap::new()),
            request_timeout,
        }
    }

    /// Merge host-reported tab fields into the mirror.
    pub fn sync_tab(&self, tab_id: &str, params: &Value) {
        let mut tabs = self.tabs.lock().unwrap_or_else(|e| e.into_inner());
        let tab = tabs.entry(tab_id.to_string()).or_default();
        if let Some(title) = params.get("title").and_then(Value::as_str) {
            tab.title = Some(title.to_string());
        }
        if let Some(url) = params.get("url").and_then(Value::as_str) {
            tab.url = Some(url.to_string());
        }
        if let Some(icon) = params.get("icon_url").and_then(Value::as_str) {
            tab.icon_url = Some(icon.to_string());
        }
        if let Some(audible) = params.get("audible").and_then(Value::as_bool) {
            tab.audible = audible;
        }
    }

    /// Drop a closed tab from the mirror.
    pub fn forget_tab(&self, tab_id: &str) {
        self.tabs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(tab_id);
    }

    /// Route an `agent.response` line to the pending request it answers.
    pub fn resolve(&self, request_id: &str, result: Value) {
        let sender = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(request_id);
        match sender {
            Some(tx) => {
                // A receiver dropped between timeout and resolution is the
                // same late-response case as below.
                let _ = tx.send(result);
            }
            // Policy: responses that arrive after their request timed out
            // are dropped; the next poll tick supersedes them anyway.
            None => debug!("dropping late agent response for request {}", request_id),
        }
    }

    fn emit(&self, event: Value) -> Result<(), HostError> {
        self.out
            .send(event.to_string())
            .map_err(|_| HostError::Unavailable("stdout writer closed".to_string()))
    }

    async fn request(&self, tab_id: &str, message: Value) -> Result<Value, AgentError> {
        let request_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(request_id.clone(), tx);

        let line = json!({
            "event": "agent_request",
            "request_id": request_id,
            "tab_id": tab_id,
            "message": message,
        });
        if self.out.send(line.to_string()).is_err() {
            self.pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&request_id);
            return Err(AgentError::Transport("stdout writer closed".to_string()));
        }

        match timeout(self.request_timeout, rx).await {
            Ok(Ok(value)) => {
                if value.get("error").and_then(Value::as_str) == Some("no_agent") {
                    return Err(AgentError::Unavailable(tab_id.to_string()));
                }
                Ok(value)
            }
            Ok(Err(_)) => Err(AgentError::Transport("responder dropped".to_string())),
            Err(_) => {
                self.pending
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&request_id);
                Err(AgentError::Timeout(tab_id.to_string()))
            }
        }
    }
}

#[async_trait]
impl RemoteAgent for StdioBridge {
    async fn query(&self, tab_id: &str) -> Result<AudioStateReport, AgentError> {
        let value = self
            .request(tab_id, json!({"type": "REQUEST_AUDIO_STATE"}))
            .await?;
        let playing = value
            .get("playing")
            .and_then(Value::as_bool)
            .ok_or_else(|| AgentError::Transport("malformed state response".to_string()))?;
        Ok(AudioStateReport {
            playing,
            volume: value.get("volume").and_then(Value::as_f64).unwrap_or(1.0),
            muted: value.get("muted").and_then(Value::as_bool).unwrap_or(false),
        })
    }

    async fn execute(&self, tab_id: &str, command: &AudioCommand) -> Result<(), AgentError> {
        let value = self
            .request(
                tab_id,
                json!({
                    "type": "CONTROL_AUDIO",
                    "action": command.action_name(),
                    "value": command.wire_value(),
                }),
            )
            .await?;
        if value.get("success").and_then(Value::as_bool) == Some(true) {
            Ok(())
        } else {
            Err(AgentError::Transport(format!(
                "command rejected: {}",
                value.get("error").and_then(Value::as_str).unwrap_or("unknown")
            )))
        }
    }

    async fn secondary_mute_state(&self, tab_id: &str) -> Result<Option<bool>, AgentError> {
        let value = self
            .request(tab_id, json!({"type": "QUERY_SECONDARY_MUTE"}))
            .await?;
        Ok(value.get("muted").and_then(Value::as_bool))
    }

    async fn toggle_secondary_mute(&self, tab_id: &str) -> Result<(), AgentError> {
        let value = self
            .request(tab_id, json!({"type": "TOGGLE_SECONDARY_MUTE"}))
            .await?;
        if value.get("success").and_then(Value::as_bool) == Some(true) {
            Ok(())
        } else {
            Err(AgentError::Transport("secondary toggle rejected".to_string()))
        }
    }
}

impl TabHost for StdioBridge {
    fn list_tabs(&self) -> Vec<String> {
        self.tabs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    fn audible_hint(&self, tab_id: &str) -> Option<bool> {
        self.tabs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(tab_id)
            .map(|t| t.audible)
    }

    fn tab_metadata(&self, tab_id: &str) -> Option<TabMetadata> {
        self.tabs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(tab_id)
            .map(|t| TabMetadata {
                title: t.title.clone(),
                url: t.url.clone(),
                icon_url: t.icon_url.clone(),
            })
    }

    fn set_badge(&self, badge: &Badge) -> Result<(), HostError> {
        self.emit(json!({
            "event": "badge",
            "text": badge.text,
            "color": badge.color,
        }))
    }

    fn request_agent_injection(&self, tab_id: &str) -> Result<(), HostError> {
        self.emit(json!({
            "event": "inject_agent",
            "tab_id": tab_id,
        }))
    }
}
