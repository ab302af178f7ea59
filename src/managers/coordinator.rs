//! The coordinator owns the registry and serializes every mutation.
//!
//! All signal sources (push listener, poller, lifecycle hooks) and the
//! dispatcher's optimistic updates funnel through methods on
//! [`AudioCoordinator`], which holds an internal mutex for the duration of
//! one reconcile-and-apply step. Signals for the same tab are therefore
//! applied atomically and in receipt order; signals for different tabs
//! cannot corrupt each other's entries.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::{debug, warn};

use crate::managers::reconciler::reconcile;
use crate::managers::registry::{AudioRegistry, AudioRegistryTrait};
use crate::services::badge::{render_badge, Badge};
use crate::services::host::TabHost;
use crate::types::errors::SignalError;
use crate::types::signal::{AudioStateReport, Decision, Signal};
use crate::types::tab::{TabAudioState, TabMetadata};

/// What a reconciled signal actually did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Added,
    Updated,
    Removed,
    Unchanged,
}

struct Inner {
    registry: AudioRegistry,
    /// Tabs whose agent reference was invalidated by navigation and has not
    /// been re-established. Polled via the fallback path only.
    invalidated: HashSet<String>,
    badge: Badge,
}

/// Coordinator for audio state across all tabs.
pub struct AudioCoordinator {
    host: Arc<dyn TabHost>,
    inner: Mutex<Inner>,
}

impl AudioCoordinator {
    pub fn new(host: Arc<dyn TabHost>) -> Self {
        Self {
            host,
            inner: Mutex::new(Inner {
                registry: AudioRegistry::new(),
                invalidated: HashSet::new(),
                badge: Badge::blank(),
            }),
        }
    }

    fn now_ms() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Lock poisoning would mean a panic mid-apply; recover the data,
        // the registry itself is never left half-written.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reconcile and apply one signal. Descriptive metadata is filled in
    /// from the host when the signal does not already carry it.
    pub fn apply_signal(&self, tab_id: &str, signal: Signal) -> Applied {
        let signal = if signal.meta.is_none() {
            let meta = self.host.tab_metadata(tab_id);
            signal.with_meta(meta)
        } else {
            signal
        };

        let mut inner = self.lock();
        // Any non-fallback signal proves a live agent in the page.
        if signal.source.is_authoritative() {
            inner.invalidated.remove(tab_id);
        }
        self.apply_locked(&mut inner, tab_id, &signal)
    }

    fn apply_locked(&self, inner: &mut Inner, tab_id: &str, signal: &Signal) -> Applied {
        let before = inner.registry.size();
        let decision = reconcile(inner.registry.get(tab_id), tab_id, signal, Self::now_ms());
        let applied = match decision {
            Decision::NoChange => Applied::Unchanged,
            Decision::Upsert(state) => {
                let added = !inner.registry.contains(tab_id);
                inner.registry.upsert(state);
                if added {
                    Applied::Added
                } else {
                    Applied::Updated
                }
            }
            Decision::Remove => {
                inner.registry.remove(tab_id);
                Applied::Removed
            }
        };
        self.refresh_badge(inner, before);
        applied
    }

    /// Re-render and publish the badge, but only on an actual size
    /// transition. Published under the lock so indicator updates cannot
    /// reorder.
    fn refresh_badge(&self, inner: &mut Inner, before: usize) {
        let after = inner.registry.size();
        if after == before {
            return;
        }
        let badge = render_badge(after);
        if badge == inner.badge {
            return;
        }
        inner.badge = badge.clone();
        // Policy: indicator publication is best-effort; a failed host call
        // leaves the on-screen badge stale until the next transition.
        if let Err(e) = self.host.set_badge(&badge) {
            warn!("badge update failed: {}", e);
        }
    }

    // ─── Push listener ───

    /// Accept an unsolicited state report from a tab's agent. Malformed
    /// payloads are rejected without touching the registry; the caller is
    /// expected to drop them silently.
    pub fn handle_push(&self, tab_id: &str, payload: &Value) -> Result<Applied, SignalError> {
        let signal = parse_push(payload)?;
        Ok(self.apply_signal(tab_id, signal))
    }

    // ─── Poller intake ───

    /// Apply a successful agent query response.
    pub fn apply_agent_report(&self, tab_id: &str, report: &AudioStateReport) -> Applied {
        self.apply_signal(tab_id, Signal::poll_agent(report))
    }

    /// Apply the host-level audible hint for a tab whose agent was
    /// unreachable this tick.
    pub fn apply_fallback_hint(&self, tab_id: &str, audible: bool) -> Applied {
        self.apply_signal(tab_id, Signal::poll_fallback(audible))
    }

    // ─── Lifecycle hooks ───

    /// Tab closed: remove unconditionally, whatever the last known state.
    pub fn tab_closed(&self, tab_id: &str) -> bool {
        let mut inner = self.lock();
        let before = inner.registry.size();
        let removed = inner.registry.remove(tab_id).is_some();
        inner.invalidated.remove(tab_id);
        self.refresh_badge(&mut inner, before);
        removed
    }

    /// Tab navigated: the in-page agent is gone until a fresh one reports.
    /// The entry (if any) survives, since only an authoritative signal may
    /// evict it, but its URL is refreshed best-effort.
    pub fn tab_navigated(&self, tab_id: &str, url: Option<&str>) {
        let mut inner = self.lock();
        inner.invalidated.insert(tab_id.to_string());
        if let Some(mut entry) = inner.registry.get(tab_id).cloned() {
            if let Some(url) = url {
                entry.url = url.to_string();
            }
            inner.registry.upsert(entry);
        }
    }

    /// Tab finished loading: ask the host to (re-)inject an agent.
    pub fn tab_loaded(&self, tab_id: &str) {
        // Policy: privileged pages reject injection; the tab then simply
        // stays on the fallback path.
        if let Err(e) = self.host.request_agent_injection(tab_id) {
            debug!("agent injection into tab {} rejected: {}", tab_id, e);
        }
    }

    /// Descriptive metadata changed (title or icon); refresh the entry in
    /// place. Audio state and the badge are untouched.
    pub fn tab_metadata_updated(&self, tab_id: &str, meta: &TabMetadata) {
        let mut inner = self.lock();
        if let Some(mut entry) = inner.registry.get(tab_id).cloned() {
            if let Some(title) = &meta.title {
                entry.title = title.clone();
            }
            if let Some(url) = &meta.url {
                entry.url = url.clone();
            }
            if let Some(icon) = &meta.icon_url {
                entry.icon_url = Some(icon.clone());
            }
            inner.registry.upsert(entry);
        }
    }

    /// A freshly injected agent announced itself.
    pub fn agent_ready(&self, tab_id: &str) {
        self.lock().invalidated.remove(tab_id);
    }

    /// Whether the tab's agent reference is currently trusted for queries.
    pub fn agent_reachable(&self, tab_id: &str) -> bool {
        !self.lock().invalidated.contains(tab_id)
    }

    // ─── Read side ───

    pub fn snapshot(&self) -> Vec<TabAudioState> {
        self.lock().registry.snapshot_all()
    }

    pub fn get(&self, tab_id: &str) -> Option<TabAudioState> {
        self.lock().registry.get(tab_id).cloned()
    }

    pub fn size(&self) -> usize {
        self.lock().registry.size()
    }

    pub fn badge(&self) -> Badge {
        self.lock().badge.clone()
    }

    pub fn url_of(&self, tab_id: &str) -> Option<String> {
        self.lock().registry.get(tab_id).map(|e| e.url.clone())
    }

    // ─── Optimistic updates (command dispatcher only) ───
    //
    // These route the dispatcher's local mutations through the same lock as
    // the reconciler, preserving the single-writer discipline. They never
    // change the entry set, so the badge is untouched.

    /// Set the volume ahead of the remote ack. Returns the prior value for
    /// rollback, or `None` when the tab is not tracked.
    pub fn optimistic_volume(&self, tab_id: &str, volume: f64) -> Option<f64> {
        let mut inner = self.lock();
        let mut entry = inner.registry.get(tab_id).cloned()?;
        let prior = entry.volume;
        entry.volume = volume;
        inner.registry.upsert(entry);
        Some(prior)
    }

    /// Set the muted flag ahead of the remote ack. Returns the prior value.
    pub fn optimistic_muted(&self, tab_id: &str, muted: bool) -> Option<bool> {
        let mut inner = self.lock();
        let mut entry = inner.registry.get(tab_id).cloned()?;
        let prior = entry.muted;
        entry.muted = muted;
        inner.registry.upsert(entry);
        Some(prior)
    }

    /// Flip the muted flag ahead of the remote ack. Returns the prior value.
    pub fn optimistic_toggle_mute(&self, tab_id: &str) -> Option<bool> {
        let mut inner = self.lock();
        let mut entry = inner.registry.get(tab_id).cloned()?;
        let prior = entry.muted;
        entry.muted = !prior;
        inner.registry.upsert(entry);
        Some(prior)
    }

    /// Undo an optimistic volume update after a failed remote call.
    pub fn rollback_volume(&self, tab_id: &str, volume: f64) {
        let mut inner = self.lock();
        if let Some(mut entry) = inner.registry.get(tab_id).cloned() {
            entry.volume = volume;
            inner.registry.upsert(entry);
        }
    }

    /// Undo an optimistic mute update after a failed remote call.
    pub fn rollback_muted(&self, tab_id: &str, muted: bool) {
        let mut inner = self.lock();
        if let Some(mut entry) = inner.registry.get(tab_id).cloned() {
            entry.muted = muted;
            inner.registry.upsert(entry);
        }
    }
}

/// Validate a raw push payload into a signal. Anything out of schema is an
/// error; the payload never reaches the reconciler.
fn parse_push(payload: &Value) -> Result<Signal, SignalError> {
    let playing = payload
        .get("playing")
        .and_then(Value::as_bool)
        .ok_or(SignalError::MissingField("playing"))?;

    let volume = match payload.get("volume") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let v = v.as_f64().ok_or(SignalError::MissingField("volume"))?;
            if !(0.0..=1.0).contains(&v) {
                return Err(SignalError::OutOfRange(format!("volume: {}", v)));
            }
            Some(v)
        }
    };

    let muted = match payload.get("muted") {
        None | Some(Value::Null) => None,
        Some(m) => Some(m.as_bool().ok_or(SignalError::MissingField("muted"))?),
    };

    Ok(Signal::push(playing, volume, muted))
}
