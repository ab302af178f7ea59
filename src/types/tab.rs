use serde::{Deserialize, Serialize};

/// Audio state tracked for a single browser tab.
///
/// An entry exists in the registry only while the tab is believed to be
/// playing audio; `muted` alone never removes it (muted is not stopped).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabAudioState {
    pub tab_id: String,
    pub title: String,
    pub url: String,
    pub icon_url: Option<String>,
    /// Volume in [0.0, 1.0].
    pub volume: f64,
    pub muted: bool,
    /// True iff the tab is believed to currently be producing audio.
    pub playing: bool,
    /// Milliseconds-since-epoch of the last accepted signal for this tab.
    pub last_update: i64,
}

impl TabAudioState {
    /// Field-wise equality ignoring `last_update`.
    ///
    /// Used to detect no-op reconciliations: a repeated identical signal
    /// must not count as a mutation.
    pub fn same_fields(&self, other: &TabAudioState) -> bool {
        self.tab_id == other.tab_id
            && self.title == other.title
            && self.url == other.url
            && self.icon_url == other.icon_url
            && self.volume == other.volume
            && self.muted == other.muted
            && self.playing == other.playing
    }
}

/// Descriptive tab metadata reported by the host. Best-effort, may be stale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TabMetadata {
    pub title: Option<String>,
    pub url: Option<String>,
    pub icon_url: Option<String>,
}
