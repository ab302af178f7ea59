//! Remote playback command dispatch.
//!
//! Volume and mute commands update the registry optimistically so UI
//! readers see the change immediately; a failed remote call rolls the
//! entry back to its prior value. Playback-state commands (`play`,
//! `pause`, ...) are forwarded without touching `playing` — the next
//! authoritative push or poll confirms the transition.

use std::sync::Arc;

use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::managers::coordinator::AudioCoordinator;
use crate::services::remote_agent::RemoteAgent;
use crate::types::command::{AudioCommand, CommandAck};
use crate::types::config::CoordinatorConfig;
use crate::types::errors::{AgentError, CommandError};

/// Host domains whose pages carry their own mute control that does not
/// track the underlying media element. After a native mute, the displayed
/// control must be checked and, only if mismatched, toggled once.
const SECONDARY_MUTE_DOMAINS: &[&str] = &["youtube.com", "vimeo.com"];

pub struct CommandDispatcher {
    coordinator: Arc<AudioCoordinator>,
    agent: Arc<dyn RemoteAgent>,
    config: CoordinatorConfig,
}

impl CommandDispatcher {
    pub fn new(
        coordinator: Arc<AudioCoordinator>,
        agent: Arc<dyn RemoteAgent>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            coordinator,
            agent,
            config,
        }
    }

    /// Send a command to a tab's agent. Errors are returned to the caller
    /// and never retried here.
    pub async fn dispatch(
        &self,
        tab_id: &str,
        command: AudioCommand,
    ) -> Result<CommandAck, CommandError> {
        match command {
            AudioCommand::SetVolume(volume) => self.set_volume(tab_id, volume).await,
            AudioCommand::SetMuted(muted) => self.set_muted(tab_id, Some(muted)).await,
            AudioCommand::ToggleMute => self.set_muted(tab_id, None).await,
            other => self.forward(tab_id, other).await,
        }
    }

    async fn set_volume(&self, tab_id: &str, volume: f64) -> Result<CommandAck, CommandError> {
        let command = AudioCommand::SetVolume(volume);
        let prior = self.coordinator.optimistic_volume(tab_id, volume);
        match self.send(tab_id, &command).await {
            Ok(()) => Ok(ack(tab_id, &command)),
            Err(e) => {
                if let Some(prior) = prior {
                    self.coordinator.rollback_volume(tab_id, prior);
                }
                Err(e)
            }
        }
    }

    /// `Some(target)` for an absolute mute, `None` for a toggle.
    async fn set_muted(
        &self,
        tab_id: &str,
        desired: Option<bool>,
    ) -> Result<CommandAck, CommandError> {
        let command = match desired {
            Some(muted) => AudioCommand::SetMuted(muted),
            None => AudioCommand::ToggleMute,
        };
        let prior = match desired {
            Some(muted) => self.coordinator.optimistic_muted(tab_id, muted),
            None => self.coordinator.optimistic_toggle_mute(tab_id),
        };
        match self.send(tab_id, &command).await {
            Ok(()) => {
                // The target state is known either from the request or from
                // the registry entry we just flipped.
                let target = desired.or(prior.map(|p| !p));
                if let Some(target) = target {
                    self.sync_secondary_mute(tab_id, target).await;
                }
                Ok(ack(tab_id, &command))
            }
            Err(e) => {
                if let Some(prior) = prior {
                    self.coordinator.rollback_muted(tab_id, prior);
                }
                Err(e)
            }
        }
    }

    async fn forward(
        &self,
        tab_id: &str,
        command: AudioCommand,
    ) -> Result<CommandAck, CommandError> {
        self.send(tab_id, &command).await?;
        Ok(ack(tab_id, &command))
    }

    async fn send(&self, tab_id: &str, command: &AudioCommand) -> Result<(), CommandError> {
        match timeout(self.config.command_timeout, self.agent.execute(tab_id, command)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(AgentError::Timeout(tab_id.to_string()).into()),
        }
    }

    /// Synchronize a site's own mute control with the state we just set.
    ///
    /// Runs only for domains known to need it, after a settle delay so the
    /// page's state has propagated, and toggles only on mismatch: an
    /// already-correct control must never be clicked, which would invert it.
    async fn sync_secondary_mute(&self, tab_id: &str, target_muted: bool) {
        let Some(url) = self.coordinator.url_of(tab_id) else {
            return;
        };
        if !needs_secondary_sync(&url) {
            return;
        }

        sleep(self.config.settle_delay).await;

        let displayed = timeout(
            self.config.command_timeout,
            self.agent.secondary_mute_state(tab_id),
        )
        .await;
        match displayed {
            Ok(Ok(Some(displayed))) if displayed != target_muted => {
                // Policy: the native mute already succeeded; secondary sync
                // is best-effort and its failure is not surfaced.
                if let Err(e) = self.agent.toggle_secondary_mute(tab_id).await {
                    debug!("secondary mute sync failed for tab {}: {}", tab_id, e);
                }
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!("secondary mute state query failed for tab {}: {}", tab_id, e),
            Err(_) => debug!("secondary mute state query timed out for tab {}", tab_id),
        }
    }
}

fn ack(tab_id: &str, command: &AudioCommand) -> CommandAck {
    CommandAck {
        tab_id: tab_id.to_string(),
        action: command.action_name().to_string(),
    }
}

/// Whether the page at `url` carries a secondary mute control we track.
fn needs_secondary_sync(url: &str) -> bool {
    let Some(host) = url_host(url) else {
        return false;
    };
    SECONDARY_MUTE_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
}

/// Extract the host portion of a URL without pulling in a URL parser.
fn url_host(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let host = rest.split(['/', '?', '#']).next()?;
    let host = host.rsplit_once('@').map(|(_, h)| h).unwrap_or(host);
    let host = host.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}
