use serde::{Deserialize, Serialize};

use crate::types::tab::{TabAudioState, TabMetadata};

/// Where a signal came from, ordered by authority (highest first).
///
/// Only an in-page agent can distinguish "muted but still playing" from
/// "actually stopped"; the host-level audible flag is false in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalSource {
    /// Unsolicited report volunteered by a tab's in-page agent.
    Push,
    /// Successful response to an explicit agent query.
    PollAgent,
    /// Host-level audible hint, used only when the agent is unreachable.
    PollFallback,
}

impl SignalSource {
    /// A source that can confirm "stopped" and is therefore allowed to
    /// remove a tracked entry.
    pub fn is_authoritative(&self) -> bool {
        !matches!(self, SignalSource::PollFallback)
    }
}

/// One observation about a tab's audio state. Absent fields mean "no new
/// information" and retain whatever the registry already holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub source: SignalSource,
    pub playing: Option<bool>,
    pub volume: Option<f64>,
    pub muted: Option<bool>,
    pub meta: Option<TabMetadata>,
}

impl Signal {
    pub fn push(playing: bool, volume: Option<f64>, muted: Option<bool>) -> Self {
        Self {
            source: SignalSource::Push,
            playing: Some(playing),
            volume,
            muted,
            meta: None,
        }
    }

    pub fn poll_agent(report: &AudioStateReport) -> Self {
        Self {
            source: SignalSource::PollAgent,
            playing: Some(report.playing),
            volume: Some(report.volume),
            muted: Some(report.muted),
            meta: None,
        }
    }

    /// Fallback signal derived from the host audible hint. When the hint is
    /// set we assume full volume, unmuted; when it is not, we know nothing
    /// beyond "not audible right now".
    pub fn poll_fallback(audible: bool) -> Self {
        Self {
            source: SignalSource::PollFallback,
            playing: Some(audible),
            volume: audible.then_some(1.0),
            muted: audible.then_some(false),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Option<TabMetadata>) -> Self {
        self.meta = meta;
        self
    }
}

/// Agent response to a state query (`REQUEST_AUDIO_STATE`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AudioStateReport {
    pub playing: bool,
    pub volume: f64,
    pub muted: bool,
}

/// Outcome of reconciling one signal against the current registry entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    NoChange,
    Upsert(TabAudioState),
    Remove,
}
