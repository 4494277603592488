//! Classifier configuration.

use serde::{Deserialize, Serialize};

/// Thresholds for flagging problematic chargers. Immutable once built;
/// supplied per analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rules {
    /// Days with no port usage to consider a charger unused.
    #[serde(default = "default_unused_days")]
    pub unused_days: i64,
    /// Past window to look for long sessions (days).
    #[serde(default = "default_long_session_days")]
    pub long_session_days: i64,
    /// Minimum duration of a session to count as long (minutes).
    #[serde(default = "default_long_session_min")]
    pub long_session_min: f64,
    /// Continuous hours with all ports unavailable.
    #[serde(default = "default_unavailable_hours")]
    pub unavailable_hours: i64,
}

fn default_unused_days() -> i64 {
    4
}
fn default_long_session_days() -> i64 {
    2
}
fn default_long_session_min() -> f64 {
    5.0
}
fn default_unavailable_hours() -> i64 {
    24
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            unused_days: default_unused_days(),
            long_session_days: default_long_session_days(),
            long_session_min: default_long_session_min(),
            unavailable_hours: default_unavailable_hours(),
        }
    }
}

impl Rules {
    /// Longest lookback window any rule needs, in fractional days.
    pub fn max_window_days(&self) -> f64 {
        (self.unused_days as f64)
            .max(self.long_session_days as f64)
            .max(self.unavailable_hours as f64 / 24.0)
    }
}
