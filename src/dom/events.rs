use serde::{Deserialize, Serialize};

use super::FieldRef;

/// Notification kinds emitted while mutating a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Focus,
    Input,
    Change,
    Blur,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Focus => write!(f, "focus"),
            EventKind::Input => write!(f, "input"),
            EventKind::Change => write!(f, "change"),
            EventKind::Blur => write!(f, "blur"),
        }
    }
}

/// One synthetic notification recorded against the page.
/// The sequence number reflects global dispatch order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticEvent {
    pub target: FieldRef,
    pub kind: EventKind,
    pub sequence: u64,
    pub dispatched_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_display() {
        assert_eq!(EventKind::Focus.to_string(), "focus");
        assert_eq!(EventKind::Input.to_string(), "input");
        assert_eq!(EventKind::Change.to_string(), "change");
        assert_eq!(EventKind::Blur.to_string(), "blur");
    }
}
