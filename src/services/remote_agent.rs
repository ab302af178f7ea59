use async_trait::async_trait;

use crate::types::command::AudioCommand;
use crate::types::errors::AgentError;
use crate::types::signal::AudioStateReport;

/// The in-page observer injected into a tab: it can report the tab's true
/// audio state (playing even while muted) and execute playback commands.
///
/// Implementations are addressed by tab id; callers bound each call with
/// their own timeout.
#[async_trait]
pub trait RemoteAgent: Send + Sync {
    /// `REQUEST_AUDIO_STATE` — current playing/volume/muted state.
    async fn query(&self, tab_id: &str) -> Result<AudioStateReport, AgentError>;

    /// `CONTROL_AUDIO` — execute a playback command in the page.
    async fn execute(&self, tab_id: &str, command: &AudioCommand) -> Result<(), AgentError>;

    /// Displayed state of the site's own mute control, for pages that have
    /// one. `Ok(None)` means the page has no such control.
    async fn secondary_mute_state(&self, tab_id: &str) -> Result<Option<bool>, AgentError>;

    /// Click the site's own mute control once, inverting its displayed
    /// state. Callers must check for a mismatch first.
    async fn toggle_secondary_mute(&self, tab_id: &str) -> Result<(), AgentError>;
}
