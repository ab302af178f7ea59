//! Pure decision function for incoming audio signals.
//!
//! Given the current registry entry (or its absence) and one signal, decide
//! whether to upsert, remove, or leave the entry alone. The rules encode the
//! mute/stop distinction: only an authoritative source (a reachable agent)
//! may evict a tab, because the host-level audible flag goes false the
//! moment a user mutes a tab that is still playing.

use crate::types::signal::{Decision, Signal};
use crate::types::tab::TabAudioState;

/// Reconcile one signal against the current entry for `tab_id`.
///
/// `now_ms` stamps `last_update` on any upserted state.
pub fn reconcile(
    existing: Option<&TabAudioState>,
    tab_id: &str,
    signal: &Signal,
    now_ms: i64,
) -> Decision {
    match signal.playing {
        Some(true) => {
            let merged = merge(existing, tab_id, signal, now_ms);
            match existing {
                // Identical repeat: no mutation, no badge churn.
                Some(current) if current.same_fields(&merged) => Decision::NoChange,
                _ => Decision::Upsert(merged),
            }
        }
        Some(false) => {
            if signal.source.is_authoritative() {
                if existing.is_some() {
                    Decision::Remove
                } else {
                    Decision::NoChange
                }
            } else {
                // Host says inaudible but no agent confirmed it. The tab may
                // simply be muted; a fallback signal may add a never-seen
                // tab, never remove a known one.
                Decision::NoChange
            }
        }
        // Volume/mute-only report: fold into an existing entry, but never
        // create one without a playing confirmation.
        None => match existing {
            Some(current) => {
                let merged = merge(existing, tab_id, signal, now_ms);
                if current.same_fields(&merged) {
                    Decision::NoChange
                } else {
                    Decision::Upsert(merged)
                }
            }
            None => Decision::NoChange,
        },
    }
}

/// Merge signal fields over the existing entry. Fields absent from the
/// signal retain their current values; a brand-new entry gets defaults.
fn merge(
    existing: Option<&TabAudioState>,
    tab_id: &str,
    signal: &Signal,
    now_ms: i64,
) -> TabAudioState {
    let meta = signal.meta.as_ref();
    TabAudioState {
        tab_id: tab_id.to_string(),
        title: meta
            .and_then(|m| m.title.clone())
            .or_else(|| existing.map(|e| e.title.clone()))
            .unwrap_or_else(|| "Unknown".to_string()),
        url: meta
            .and_then(|m| m.url.clone())
            .or_else(|| existing.map(|e| e.url.clone()))
            .unwrap_or_default(),
        icon_url: meta
            .and_then(|m| m.icon_url.clone())
            .or_else(|| existing.and_then(|e| e.icon_url.clone())),
        volume: signal
            .volume
            .or(existing.map(|e| e.volume))
            .unwrap_or(1.0),
        muted: signal
            .muted
            .or(existing.map(|e| e.muted))
            .unwrap_or(false),
        playing: signal
            .playing
            .or(existing.map(|e| e.playing))
            .unwrap_or(false),
        last_update: now_ms,
    }
}
