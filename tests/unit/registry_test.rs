use tabsound::managers::registry::{AudioRegistry, AudioRegistryTrait};
use tabsound::types::tab::TabAudioState;

fn state(tab_id: &str, volume: f64) -> TabAudioState {
    TabAudioState {
        tab_id: tab_id.to_string(),
        title: format!("Tab {}", tab_id),
        url: format!("https://example.com/{}", tab_id),
        icon_url: None,
        volume,
        muted: false,
        playing: true,
        last_update: 0,
    }
}

#[test]
fn test_upsert_and_get() {
    let mut registry = AudioRegistry::new();
    registry.upsert(state("5", 1.0));
    assert_eq!(registry.size(), 1);
    assert!(registry.contains("5"));
    assert_eq!(registry.get("5").unwrap().volume, 1.0);
}

#[test]
fn test_upsert_overwrites_in_place() {
    let mut registry = AudioRegistry::new();
    registry.upsert(state("5", 1.0));
    registry.upsert(state("5", 0.4));
    assert_eq!(registry.size(), 1);
    assert_eq!(registry.get("5").unwrap().volume, 0.4);
}

#[test]
fn test_remove_returns_previous_entry() {
    let mut registry = AudioRegistry::new();
    registry.upsert(state("5", 0.8));
    let removed = registry.remove("5");
    assert_eq!(removed.unwrap().volume, 0.8);
    assert!(!registry.contains("5"));
    assert_eq!(registry.size(), 0);
}

#[test]
fn test_remove_unknown_is_none() {
    let mut registry = AudioRegistry::new();
    assert!(registry.remove("404").is_none());
}

#[test]
fn test_snapshot_is_sorted_and_detached() {
    let mut registry = AudioRegistry::new();
    registry.upsert(state("9", 1.0));
    registry.upsert(state("5", 1.0));
    registry.upsert(state("12", 1.0));

    let snapshot = registry.snapshot_all();
    let ids: Vec<&str> = snapshot.iter().map(|t| t.tab_id.as_str()).collect();
    assert_eq!(ids, vec!["12", "5", "9"]);

    // Snapshots are clones; later mutations don't show through.
    registry.remove("5");
    assert_eq!(snapshot.len(), 3);
    assert_eq!(registry.size(), 2);
}

#[test]
fn test_empty_registry() {
    let registry = AudioRegistry::new();
    assert_eq!(registry.size(), 0);
    assert!(registry.get("5").is_none());
    assert!(registry.snapshot_all().is_empty());
}
