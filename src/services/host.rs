use crate::services::badge::Badge;
use crate::types::errors::HostError;
use crate::types::tab::TabMetadata;

/// The host browser boundary: tab enumeration, the coarse audible hint,
/// descriptive metadata, the action badge, and agent injection.
///
/// The audible hint is deliberately weak: it reads false for a muted tab
/// that is still playing, which is exactly why it never gets authority to
/// remove registry entries.
pub trait TabHost: Send + Sync {
    /// Ids of every tab currently open in the host. Order is meaningless.
    fn list_tabs(&self) -> Vec<String>;

    /// Host-level "is this tab audible" flag. `None` when the tab is gone.
    fn audible_hint(&self, tab_id: &str) -> Option<bool>;

    /// Title/url/icon for a tab, if the host still knows it.
    fn tab_metadata(&self, tab_id: &str) -> Option<TabMetadata>;

    /// Update the action badge.
    fn set_badge(&self, badge: &Badge) -> Result<(), HostError>;

    /// Ask the host to (re-)inject an agent into the tab. Rejection is
    /// normal for privileged pages.
    fn request_agent_injection(&self, tab_id: &str) -> Result<(), HostError>;
}
