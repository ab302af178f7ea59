//! tabsound — tab audio monitoring and remote playback control.
//!
//! Entry point: console demo walking each coordinator component with a
//! scripted host and agent. The real deployment runs the `tabsound-rpc`
//! binary against host glue.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::json;

use tabsound::managers::coordinator::AudioCoordinator;
use tabsound::managers::reconciler::reconcile;
use tabsound::managers::registry::{AudioRegistry, AudioRegistryTrait};
use tabsound::services::badge::{render_badge, Badge};
use tabsound::services::dispatcher::CommandDispatcher;
use tabsound::services::host::TabHost;
use tabsound::services::poller::AudioPoller;
use tabsound::services::remote_agent::RemoteAgent;
use tabsound::types::command::AudioCommand;
use tabsound::types::config::CoordinatorConfig;
use tabsound::types::errors::{AgentError, HostError};
use tabsound::types::signal::{AudioStateReport, Signal};
use tabsound::types::tab::TabMetadata;

#[tokio::main]
async fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               tabsound v{} — Demo Mode                    ║", env!("CARGO_PKG_VERSION"));
    println!("║       Tab audio monitoring & remote playback control       ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    demo_badge();
    demo_reconciler();
    demo_registry();
    demo_coordinator();
    demo_dispatcher().await;
    demo_poller().await;

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ All coordinator components demonstrated successfully!");
    println!("  tabsound is ready for host-glue integration.");
    println!("═══════════════════════════════════════════════════════════════");
}

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

// ─── Scripted collaborators ───

#[derive(Default)]
struct DemoHost {
    tabs: Mutex<HashMap<String, (String, String, bool)>>, // title, url, audible
    badges: Mutex<Vec<Badge>>,
}

impl DemoHost {
    fn add_tab(&self, tab_id: &str, title: &str, url: &str, audible: bool) {
        self.tabs.lock().unwrap().insert(
            tab_id.to_string(),
            (title.to_string(), url.to_string(), audible),
        );
    }
}

impl TabHost for DemoHost {
    fn list_tabs(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tabs.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn audible_hint(&self, tab_id: &str) -> Option<bool> {
        self.tabs.lock().unwrap().get(tab_id).map(|t| t.2)
    }

    fn tab_metadata(&self, tab_id: &str) -> Option<TabMetadata> {
        self.tabs.lock().unwrap().get(tab_id).map(|t| TabMetadata {
            title: Some(t.0.clone()),
            url: Some(t.1.clone()),
            icon_url: None,
        })
    }

    fn set_badge(&self, badge: &Badge) -> Result<(), HostError> {
        self.badges.lock().unwrap().push(badge.clone());
        Ok(())
    }

    fn request_agent_injection(&self, _tab_id: &str) -> Result<(), HostError> {
        Ok(())
    }
}

#[derive(Default)]
struct DemoAgent {
    states: Mutex<HashMap<String, AudioStateReport>>,
    secondary: Mutex<HashMap<String, bool>>,
    executed: Mutex<Vec<(String, String)>>,
}

#[async_trait::async_trait]
impl RemoteAgent for DemoAgent {
    async fn query(&self, tab_id: &str) -> Result<AudioStateReport, AgentError> {
        self.states
            .lock()
            .unwrap()
            .get(tab_id)
            .copied()
            .ok_or_else(|| AgentError::Unavailable(tab_id.to_string()))
    }

    async fn execute(&self, tab_id: &str, command: &AudioCommand) -> Result<(), AgentError> {
        if !self.states.lock().unwrap().contains_key(tab_id) {
            return Err(AgentError::Unavailable(tab_id.to_string()));
        }
        self.executed
            .lock()
            .unwrap()
            .push((tab_id.to_string(), command.action_name().to_string()));
        Ok(())
    }

    async fn secondary_mute_state(&self, tab_id: &str) -> Result<Option<bool>, AgentError> {
        Ok(self.secondary.lock().unwrap().get(tab_id).copied())
    }

    async fn toggle_secondary_mute(&self, tab_id: &str) -> Result<(), AgentError> {
        let mut secondary = self.secondary.lock().unwrap();
        if let Some(state) = secondary.get_mut(tab_id) {
            *state = !*state;
        }
        Ok(())
    }
}

// ─── Sections ───

fn demo_badge() {
    section("Badge Presenter");

    for count in [0usize, 1, 2, 12] {
        let badge = render_badge(count);
        println!("  count={:<2} -> text={:?} color={:?}", count, badge.text, badge.color);
    }
    println!("  ✓ BadgePresenter OK");
    println!();
}

fn demo_reconciler() {
    section("Reconciler");

    let push = Signal::push(true, Some(0.8), Some(false));
    let decision = reconcile(None, "5", &push, 0);
    println!("  Push(playing) on unknown tab -> {:?}", kind(&decision));

    let entry = match decision {
        tabsound::types::signal::Decision::Upsert(state) => state,
        _ => unreachable!(),
    };

    let fallback = Signal::poll_fallback(false);
    println!(
        "  Fallback(inaudible) on tracked tab -> {:?} (muted is not stopped)",
        kind(&reconcile(Some(&entry), "5", &fallback, 1))
    );

    let agent_stop = Signal::poll_agent(&AudioStateReport { playing: false, volume: 0.8, muted: false });
    println!(
        "  Agent(stopped) on tracked tab -> {:?}",
        kind(&reconcile(Some(&entry), "5", &agent_stop, 2))
    );

    println!(
        "  Identical repeat push -> {:?} (idempotent)",
        kind(&reconcile(Some(&entry), "5", &push, 3))
    );
    println!("  ✓ Reconciler OK");
    println!();
}

fn kind(decision: &tabsound::types::signal::Decision) -> &'static str {
    match decision {
        tabsound::types::signal::Decision::NoChange => "NoChange",
        tabsound::types::signal::Decision::Upsert(_) => "Upsert",
        tabsound::types::signal::Decision::Remove => "Remove",
    }
}

fn demo_registry() {
    section("Audio Registry");

    let mut registry = AudioRegistry::new();
    for (id, title) in [("5", "Jazz radio"), ("9", "Synthwave mix")] {
        registry.upsert(tabsound::types::tab::TabAudioState {
            tab_id: id.to_string(),
            title: title.to_string(),
            url: format!("https://music.example/{}", id),
            icon_url: None,
            volume: 1.0,
            muted: false,
            playing: true,
            last_update: 0,
        });
    }
    println!("  Upserted 2 entries, size = {}", registry.size());
    println!("  Snapshot: {:?}", registry.snapshot_all().iter().map(|t| t.tab_id.clone()).collect::<Vec<_>>());

    registry.remove("9");
    println!("  Removed tab 9, contains(9) = {}", registry.contains("9"));
    println!("  ✓ AudioRegistry OK");
    println!();
}

fn demo_coordinator() {
    section("Audio Coordinator (scenarios)");

    let host = Arc::new(DemoHost::default());
    host.add_tab("5", "Jazz radio", "https://music.example/5", true);
    host.add_tab("9", "Synthwave mix", "https://music.example/9", true);
    let coordinator = AudioCoordinator::new(host.clone());

    coordinator
        .handle_push("5", &json!({"playing": true, "volume": 1.0, "muted": false}))
        .unwrap();
    coordinator
        .handle_push("9", &json!({"playing": true, "volume": 0.6, "muted": false}))
        .unwrap();
    println!("  Two tabs playing -> badge {:?}", coordinator.badge().text);

    coordinator.handle_push("9", &json!({"playing": false})).unwrap();
    println!("  Tab 9 ended -> badge {:?}", coordinator.badge().text);

    coordinator.apply_fallback_hint("5", false);
    println!(
        "  Fallback says tab 5 inaudible -> still tracked = {} (likely just muted)",
        coordinator.get("5").is_some()
    );

    coordinator.tab_closed("5");
    println!("  Tab 5 closed -> badge {:?} (blank)", coordinator.badge().text);

    let history: Vec<String> = host.badges.lock().unwrap().iter().map(|b| b.text.clone()).collect();
    println!("  Host badge history: {:?}", history);
    println!("  ✓ AudioCoordinator OK");
    println!();
}

async fn demo_dispatcher() {
    section("Command Dispatcher");

    let host = Arc::new(DemoHost::default());
    host.add_tab("5", "Music video", "https://www.youtube.com/watch?v=x", true);
    let coordinator = Arc::new(AudioCoordinator::new(host.clone()));
    let agent = Arc::new(DemoAgent::default());
    agent.states.lock().unwrap().insert(
        "5".to_string(),
        AudioStateReport { playing: true, volume: 1.0, muted: false },
    );
    agent.secondary.lock().unwrap().insert("5".to_string(), false);
    coordinator.handle_push("5", &json!({"playing": true, "volume": 1.0, "muted": false})).unwrap();

    let mut config = CoordinatorConfig::default();
    config.settle_delay = std::time::Duration::from_millis(1);
    let dispatcher = CommandDispatcher::new(coordinator.clone(), agent.clone(), config);

    dispatcher.dispatch("5", AudioCommand::SetVolume(0.4)).await.unwrap();
    println!("  setVolume(0.4) -> registry volume = {}", coordinator.get("5").unwrap().volume);

    dispatcher.dispatch("5", AudioCommand::SetMuted(true)).await.unwrap();
    println!(
        "  setMuted(true) -> muted = {}, site control synced = {}",
        coordinator.get("5").unwrap().muted,
        agent.secondary.lock().unwrap()["5"]
    );

    let missing = dispatcher.dispatch("404", AudioCommand::Pause).await;
    println!("  pause on unknown tab -> {:?}", missing.err().map(|e| e.to_string()));

    let executed = agent.executed.lock().unwrap().clone();
    println!("  Agent executed: {:?}", executed);
    println!("  ✓ CommandDispatcher OK");
    println!();
}

async fn demo_poller() {
    section("Audio Poller");

    let host = Arc::new(DemoHost::default());
    host.add_tab("5", "Jazz radio", "https://music.example/5", false);
    host.add_tab("7", "No agent here", "https://news.example", true);
    let coordinator = Arc::new(AudioCoordinator::new(host.clone()));
    let agent = Arc::new(DemoAgent::default());
    // Tab 5: agent reports playing-but-muted; tab 7: no agent, audible hint only.
    agent.states.lock().unwrap().insert(
        "5".to_string(),
        AudioStateReport { playing: true, volume: 0.9, muted: true },
    );

    let poller = Arc::new(AudioPoller::new(
        coordinator.clone(),
        agent,
        host,
        CoordinatorConfig::default(),
    ));
    poller.tick().await;

    let tracked: Vec<String> = coordinator.snapshot().iter().map(|t| t.tab_id.clone()).collect();
    println!("  After one tick, tracked tabs: {:?}", tracked);
    println!(
        "  Tab 5 via agent: muted = {} (host hint alone would have missed it)",
        coordinator.get("5").unwrap().muted
    );
    println!("  Tab 7 via fallback hint: playing = {}", coordinator.get("7").unwrap().playing);
    println!("  Badge: {:?}", coordinator.badge().text);
    println!("  ✓ AudioPoller OK");
}
