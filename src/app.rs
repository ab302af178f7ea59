//! App core for the tab audio coordinator.
//!
//! Central struct wiring the coordinator, poller, and dispatcher around one
//! host/agent boundary. Constructed explicitly (no global instance), so
//! tests can run many independent coordinators in parallel.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::managers::coordinator::AudioCoordinator;
use crate::services::dispatcher::CommandDispatcher;
use crate::services::host::TabHost;
use crate::services::poller::AudioPoller;
use crate::services::remote_agent::RemoteAgent;
use crate::types::config::CoordinatorConfig;

/// Central application struct owning the coordinator and its workers.
pub struct App {
    pub config: CoordinatorConfig,
    pub coordinator: Arc<AudioCoordinator>,
    pub dispatcher: CommandDispatcher,
    pub poller: Arc<AudioPoller>,
    host: Arc<dyn TabHost>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl App {
    pub fn new(
        host: Arc<dyn TabHost>,
        agent: Arc<dyn RemoteAgent>,
        config: CoordinatorConfig,
    ) -> Self {
        let coordinator = Arc::new(AudioCoordinator::new(Arc::clone(&host)));
        let dispatcher = CommandDispatcher::new(
            Arc::clone(&coordinator),
            Arc::clone(&agent),
            config.clone(),
        );
        let poller = Arc::new(AudioPoller::new(
            Arc::clone(&coordinator),
            agent,
            Arc::clone(&host),
            config.clone(),
        ));
        Self {
            config,
            coordinator,
            dispatcher,
            poller,
            host,
            poll_task: Mutex::new(None),
        }
    }

    /// Startup sequence: rediscover state and start polling.
    ///
    /// Nothing is ever persisted; the registry refills from agent
    /// injection plus the first poll ticks.
    pub fn startup(&self) {
        for tab_id in self.host.list_tabs() {
            self.coordinator.tab_loaded(&tab_id);
        }
        let handle = Arc::clone(&self.poller).spawn();
        *self.poll_task.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    /// Shutdown sequence: stop the poll loop. In-flight queries are
    /// abandoned without side effects on the registry.
    pub fn shutdown(&self) {
        if let Some(task) = self
            .poll_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}
