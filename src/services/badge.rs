use serde::{Deserialize, Serialize};

/// Fixed highlight color shown while any tab is playing.
pub const BADGE_COLOR: &str = "#4CAF50";

/// Externally visible indicator derived from the registry size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    /// Empty when no tab is playing, else the decimal count.
    pub text: String,
    /// Set only when the text is nonempty.
    pub color: Option<String>,
}

impl Badge {
    pub fn blank() -> Self {
        Self {
            text: String::new(),
            color: None,
        }
    }
}

/// Render the indicator for a given tracked-tab count.
pub fn render_badge(count: usize) -> Badge {
    if count == 0 {
        Badge::blank()
    } else {
        Badge {
            text: count.to_string(),
            color: Some(BADGE_COLOR.to_string()),
        }
    }
}
