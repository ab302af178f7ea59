//! Periodic audio-state polling.
//!
//! Every tick, each open tab gets one bounded-timeout agent query; on
//! failure the host-level audible hint stands in. Per-tab queries run
//! concurrently under a parallelism cap, so one hung page cannot stall the
//! rest. There is no retry within a tick — a missed observation is simply
//! absorbed by the next one.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::debug;

use crate::managers::coordinator::AudioCoordinator;
use crate::services::host::TabHost;
use crate::services::remote_agent::RemoteAgent;
use crate::types::config::CoordinatorConfig;

pub struct AudioPoller {
    coordinator: Arc<AudioCoordinator>,
    agent: Arc<dyn RemoteAgent>,
    host: Arc<dyn TabHost>,
    config: CoordinatorConfig,
}

impl AudioPoller {
    pub fn new(
        coordinator: Arc<AudioCoordinator>,
        agent: Arc<dyn RemoteAgent>,
        host: Arc<dyn TabHost>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            coordinator,
            agent,
            host,
            config,
        }
    }

    /// Spawn the periodic poll task. Aborting the returned handle abandons
    /// any in-flight queries without side effects on the registry.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                Arc::clone(&self).tick().await;
            }
        })
    }

    /// Poll every open tab once, with bounded parallelism.
    pub async fn tick(self: Arc<Self>) {
        let tab_ids = self.host.list_tabs();
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_queries));
        let mut tasks = JoinSet::new();
        for tab_id in tab_ids {
            let this = Arc::clone(&self);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                this.poll_one(&tab_id).await;
            });
        }
        while tasks.join_next().await.is_some() {}
    }

    /// Poll a single tab: agent query first, audible hint on failure.
    ///
    /// Also used out of cadence when the host reports an audible-flag
    /// change, so state converges faster than the next tick.
    pub async fn poll_one(&self, tab_id: &str) {
        if self.coordinator.agent_reachable(tab_id) {
            match timeout(self.config.query_timeout, self.agent.query(tab_id)).await {
                Ok(Ok(report)) => {
                    self.coordinator.apply_agent_report(tab_id, &report);
                    return;
                }
                Ok(Err(e)) => debug!("agent query failed for tab {}: {}", tab_id, e),
                Err(_) => debug!("agent query timed out for tab {}", tab_id),
            }
        }

        // The failure itself carries no information about playback; only
        // the audible hint does. A tab the host no longer knows yields no
        // signal at all this tick.
        if let Some(audible) = self.host.audible_hint(tab_id) {
            self.coordinator.apply_fallback_hint(tab_id, audible);
        }
    }
}
