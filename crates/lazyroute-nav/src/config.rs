use serde::{Deserialize, Serialize};

/// Retry behavior for chunk load failures during a navigation.
///
/// Retrying is a policy on top of the registry: the navigator resets the
/// failed chunk and requests it again. Export lookups are never retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total load attempts per navigation, including the first. `1` disables
    /// retrying.
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self { max_attempts: 1 }
    }

    /// Allow up to `max_attempts` loads per navigation (at least one).
    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Configuration for the [`Navigator`](crate::Navigator).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Chunk load retry policy.
    pub retry: RetryPolicy,
    /// Capacity of the navigation event broadcast channel.
    pub event_capacity: usize,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            event_capacity: 64,
        }
    }
}
