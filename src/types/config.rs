use std::time::Duration;

/// Tuning knobs for the coordinator, poller, and dispatcher.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Period of the audio-state poll loop.
    pub poll_interval: Duration,
    /// Bound on a single agent state query.
    pub query_timeout: Duration,
    /// Bound on a remote playback command.
    pub command_timeout: Duration,
    /// Maximum agent queries in flight during one poll tick.
    pub max_concurrent_queries: usize,
    /// Delay before inspecting a site's secondary mute control, so the
    /// page's own state has propagated.
    pub settle_delay: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            query_timeout: Duration::from_millis(500),
            command_timeout: Duration::from_secs(1),
            max_concurrent_queries: 8,
            settle_delay: Duration::from_millis(100),
        }
    }
}

impl CoordinatorConfig {
    /// Defaults with `TABSOUND_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_millis("TABSOUND_POLL_INTERVAL_MS") {
            config.poll_interval = ms;
        }
        if let Some(ms) = env_millis("TABSOUND_QUERY_TIMEOUT_MS") {
            config.query_timeout = ms;
        }
        if let Some(ms) = env_millis("TABSOUND_COMMAND_TIMEOUT_MS") {
            config.command_timeout = ms;
        }
        if let Some(n) = std::env::var("TABSOUND_MAX_CONCURRENT_QUERIES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
        {
            config.max_concurrent_queries = n;
        }
        if let Some(ms) = env_millis("TABSOUND_SETTLE_DELAY_MS") {
            config.settle_delay = ms;
        }
        config
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}
