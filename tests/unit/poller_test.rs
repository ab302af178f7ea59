use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use tabsound::managers::coordinator::AudioCoordinator;
use tabsound::services::badge::Badge;
use tabsound::services::host::TabHost;
use tabsound::services::poller::AudioPoller;
use tabsound::services::remote_agent::RemoteAgent;
use tabsound::types::command::AudioCommand;
use tabsound::types::config::CoordinatorConfig;
use tabsound::types::errors::{AgentError, HostError};
use tabsound::types::signal::AudioStateReport;
use tabsound::types::tab::TabMetadata;

/// Fake host: a fixed tab list with per-tab audible hints.
#[derive(Default)]
struct FakeHost {
    audible: Mutex<HashMap<String, bool>>,
}

impl FakeHost {
    fn with_tab(self, tab_id: &str, audible: bool) -> Self {
        self.audible.lock().unwrap().insert(tab_id.to_string(), audible);
        self
    }
}

impl TabHost for FakeHost {
    fn list_tabs(&self) -> Vec<String> {
        self.audible.lock().unwrap().keys().cloned().collect()
    }

    fn audible_hint(&self, tab_id: &str) -> Option<bool> {
        self.audible.lock().unwrap().get(tab_id).copied()
    }

    fn tab_metadata(&self, _tab_id: &str) -> Option<TabMetadata> {
        None
    }

    fn set_badge(&self, _badge: &Badge) -> Result<(), HostError> {
        Ok(())
    }

    fn request_agent_injection(&self, _tab_id: &str) -> Result<(), HostError> {
        Ok(())
    }
}

/// Fake agent: canned per-tab reports, optional response delay, query counter.
#[derive(Default)]
struct FakeAgent {
    reports: Mutex<HashMap<String, AudioStateReport>>,
    delay: Mutex<HashMap<String, Duration>>,
    queries: AtomicUsize,
}

impl FakeAgent {
    fn with_report(self, tab_id: &str, report: AudioStateReport) -> Self {
        self.reports.lock().unwrap().insert(tab_id.to_string(), report);
        self
    }

    fn with_delay(self, tab_id: &str, delay: Duration) -> Self {
        self.delay.lock().unwrap().insert(tab_id.to_string(), delay);
        self
    }
}

#[async_trait]
impl RemoteAgent for FakeAgent {
    async fn query(&self, tab_id: &str) -> Result<AudioStateReport, AgentError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay.lock().unwrap().get(tab_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.reports
            .lock()
            .unwrap()
            .get(tab_id)
            .copied()
            .ok_or_else(|| AgentError::Unavailable(tab_id.to_string()))
    }

    async fn execute(&self, _tab_id: &str, _command: &AudioCommand) -> Result<(), AgentError> {
        Ok(())
    }

    async fn secondary_mute_state(&self, _tab_id: &str) -> Result<Option<bool>, AgentError> {
        Ok(None)
    }

    async fn toggle_secondary_mute(&self, _tab_id: &str) -> Result<(), AgentError> {
        Ok(())
    }
}

fn config() -> CoordinatorConfig {
    CoordinatorConfig {
        poll_interval: Duration::from_millis(10),
        query_timeout: Duration::from_millis(50),
        command_timeout: Duration::from_millis(50),
        max_concurrent_queries: 4,
        settle_delay: Duration::from_millis(1),
    }
}

fn build(host: FakeHost, agent: FakeAgent) -> (Arc<AudioCoordinator>, Arc<FakeAgent>, Arc<AudioPoller>) {
    let host = Arc::new(host);
    let agent = Arc::new(agent);
    let coordinator = Arc::new(AudioCoordinator::new(host.clone()));
    let poller = Arc::new(AudioPoller::new(
        coordinator.clone(),
        agent.clone(),
        host,
        config(),
    ));
    (coordinator, agent, poller)
}

#[tokio::test]
async fn test_agent_report_wins_over_hint() {
    // The agent knows the tab is playing-but-muted; the host hint says
    // inaudible and would have been wrong to trust.
    let host = FakeHost::default().with_tab("5", false);
    let agent = FakeAgent::default().with_report(
        "5",
        AudioStateReport {
            playing: true,
            volume: 0.9,
            muted: true,
        },
    );
    let (coordinator, _agent, poller) = build(host, agent);

    poller.tick().await;

    let entry = coordinator.get("5").unwrap();
    assert!(entry.playing);
    assert!(entry.muted);
}

#[tokio::test]
async fn test_unavailable_agent_falls_back_to_audible_hint() {
    let host = FakeHost::default().with_tab("7", true);
    let (coordinator, _agent, poller) = build(host, FakeAgent::default());

    poller.tick().await;

    // Optimistic addition from the hint alone.
    let entry = coordinator.get("7").unwrap();
    assert!(entry.playing);
    assert_eq!(entry.volume, 1.0);
    assert!(!entry.muted);
}

#[tokio::test]
async fn test_query_timeout_is_not_a_stop_signal() {
    // Tab is tracked; its agent hangs past the timeout and the host hint
    // reads false (muted). The entry must survive the tick.
    let host = FakeHost::default().with_tab("5", false);
    let agent = FakeAgent::default()
        .with_report(
            "5",
            AudioStateReport {
                playing: true,
                volume: 1.0,
                muted: false,
            },
        )
        .with_delay("5", Duration::from_millis(500));
    let (coordinator, _agent, poller) = build(host, agent);

    coordinator
        .handle_push("5", &json!({"playing": true, "muted": true}))
        .unwrap();

    poller.tick().await;

    let entry = coordinator.get("5").unwrap();
    assert!(entry.playing);
    assert!(entry.muted, "timed-out query must leave state untouched");
}

#[tokio::test]
async fn test_agent_stop_report_removes_entry() {
    let host = FakeHost::default().with_tab("5", false);
    let agent = FakeAgent::default().with_report(
        "5",
        AudioStateReport {
            playing: false,
            volume: 1.0,
            muted: false,
        },
    );
    let (coordinator, _agent, poller) = build(host, agent);

    coordinator
        .handle_push("5", &json!({"playing": true}))
        .unwrap();
    assert_eq!(coordinator.size(), 1);

    poller.tick().await;
    assert_eq!(coordinator.size(), 0);
}

#[tokio::test]
async fn test_one_query_per_tab_per_tick() {
    let host = FakeHost::default().with_tab("5", false).with_tab("9", false);
    let agent = FakeAgent::default().with_report(
        "5",
        AudioStateReport {
            playing: true,
            volume: 1.0,
            muted: false,
        },
    );
    let (_coordinator, agent, poller) = build(host, agent);

    poller.clone().tick().await;
    // No retry within a tick: one query for each of the two tabs.
    assert_eq!(agent.queries.load(Ordering::SeqCst), 2);

    poller.tick().await;
    assert_eq!(agent.queries.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_navigated_tab_skips_agent_query() {
    let host = FakeHost::default().with_tab("5", true);
    let agent = FakeAgent::default().with_report(
        "5",
        AudioStateReport {
            playing: true,
            volume: 0.5,
            muted: false,
        },
    );
    let (coordinator, agent, poller) = build(host, agent);

    coordinator.tab_navigated("5", None);
    poller.tick().await;

    // Agent-unreachable for polling purposes: hint only, no query.
    assert_eq!(agent.queries.load(Ordering::SeqCst), 0);
    let entry = coordinator.get("5").unwrap();
    assert_eq!(entry.volume, 1.0, "state came from the fallback hint");
}

#[tokio::test]
async fn test_slow_tab_does_not_block_others() {
    let host = FakeHost::default().with_tab("slow", false).with_tab("fast", false);
    let agent = FakeAgent::default()
        .with_report(
            "slow",
            AudioStateReport {
                playing: true,
                volume: 1.0,
                muted: false,
            },
        )
        .with_delay("slow", Duration::from_millis(500))
        .with_report(
            "fast",
            AudioStateReport {
                playing: true,
                volume: 0.7,
                muted: false,
            },
        );
    let (coordinator, _agent, poller) = build(host, agent);

    poller.tick().await;

    // The hung query timed out; the fast tab's state still landed.
    assert!(coordinator.get("slow").is_none());
    assert_eq!(coordinator.get("fast").unwrap().volume, 0.7);
}

#[tokio::test]
async fn test_vanished_tab_yields_no_signal() {
    // Host lists nothing; a stale entry is left for lifecycle hooks to
    // clean up, not for the poller to guess about.
    let host = FakeHost::default();
    let (coordinator, _agent, poller) = build(host, FakeAgent::default());

    coordinator
        .handle_push("5", &json!({"playing": true}))
        .unwrap();
    poller.tick().await;
    assert_eq!(coordinator.size(), 1);
}
