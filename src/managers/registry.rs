use std::collections::HashMap;

use crate::types::tab::TabAudioState;

/// Trait defining the audio registry interface.
pub trait AudioRegistryTrait {
    fn get(&self, tab_id: &str) -> Option<&TabAudioState>;
    fn upsert(&mut self, state: TabAudioState);
    fn remove(&mut self, tab_id: &str) -> Option<TabAudioState>;
    fn contains(&self, tab_id: &str) -> bool;
    fn snapshot_all(&self) -> Vec<TabAudioState>;
    fn size(&self) -> usize;
}

/// In-memory map from tab id to its audio state — the single authoritative
/// store. Mutated only by the reconciler path; everything else reads
/// snapshots.
pub struct AudioRegistry {
    tabs: HashMap<String, TabAudioState>,
}

impl AudioRegistry {
    pub fn new() -> Self {
        Self {
            tabs: HashMap::new(),
        }
    }
}

impl Default for AudioRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioRegistryTrait for AudioRegistry {
    fn get(&self, tab_id: &str) -> Option<&TabAudioState> {
        self.tabs.get(tab_id)
    }

    fn upsert(&mut self, state: TabAudioState) {
        self.tabs.insert(state.tab_id.clone(), state);
    }

    fn remove(&mut self, tab_id: &str) -> Option<TabAudioState> {
        self.tabs.remove(tab_id)
    }

    fn contains(&self, tab_id: &str) -> bool {
        self.tabs.contains_key(tab_id)
    }

    /// Cloned view of every entry, sorted by tab id for stable output to
    /// UI clients.
    fn snapshot_all(&self) -> Vec<TabAudioState> {
        let mut all: Vec<TabAudioState> = self.tabs.values().cloned().collect();
        all.sort_by(|a, b| a.tab_id.cmp(&b.tab_id));
        all
    }

    fn size(&self) -> usize {
        self.tabs.len()
    }
}
