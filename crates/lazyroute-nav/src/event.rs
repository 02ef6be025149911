//! Navigation lifecycle events.
//!
//! The navigator publishes one `Started` event per navigation followed by
//! exactly one of `Rendered`, `Failed`, or `Superseded`.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NavigationEventKind {
    Started,
    Rendered { component: String },
    Failed { kind: String, message: String },
    Superseded { by: u64 },
}

/// A timestamped navigation event.
#[derive(Clone, Debug, Serialize)]
pub struct NavigationEvent {
    pub seq: u64,
    pub path: String,
    #[serde(flatten)]
    pub kind: NavigationEventKind,
    pub at: DateTime<Utc>,
}

impl NavigationEvent {
    pub fn new(seq: u64, path: impl Into<String>, kind: NavigationEventKind) -> Self {
        Self {
            seq,
            path: path.into(),
            kind,
            at: Utc::now(),
        }
    }

    /// Returns `true` for the event that ends a navigation.
    pub fn is_final(&self) -> bool {
        !matches!(self.kind, NavigationEventKind::Started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_events() {
        assert!(!NavigationEvent::new(1, "", NavigationEventKind::Started).is_final());
        assert!(NavigationEvent::new(1, "", NavigationEventKind::Superseded { by: 2 }).is_final());
    }

    #[test]
    fn serializes_flat() {
        let event = NavigationEvent::new(
            3,
            "dynamic",
            NavigationEventKind::Rendered {
                component: "Dynamic".into(),
            },
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["seq"], 3);
        assert_eq!(value["event"], "rendered");
        assert_eq!(value["component"], "Dynamic");
        assert!(value["at"].is_string());
    }
}
