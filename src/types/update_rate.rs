//! Update rate control for status streams

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Update rate for status streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateRate {
    /// Every status change, as fast as the control loop publishes them
    Native,

    /// At most this many updates per second
    /// If the requested rate exceeds the control-loop rate, Native is used
    Max(u32),
}

impl UpdateRate {
    /// Normalize against the control-loop poll rate
    pub fn normalize(self, poll_hz: f64) -> Self {
        match self {
            UpdateRate::Max(0) => UpdateRate::Native,
            UpdateRate::Max(hz) if hz as f64 >= poll_hz => UpdateRate::Native,
            other => other,
        }
    }

    /// Throttle interval, if one is needed
    pub fn throttle_interval(self, poll_hz: f64) -> Option<Duration> {
        match self.normalize(poll_hz) {
            UpdateRate::Native => None,
            UpdateRate::Max(hz) => Some(Duration::from_secs_f64(1.0 / hz as f64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_at_or_above_poll_rate_are_native() {
        assert_eq!(UpdateRate::Max(1000).normalize(1000.0), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(0).normalize(1000.0), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(10).normalize(1000.0), UpdateRate::Max(10));
    }

    #[test]
    fn throttle_interval_matches_rate() {
        assert_eq!(UpdateRate::Native.throttle_interval(1000.0), None);
        assert_eq!(UpdateRate::Max(4).throttle_interval(1000.0), Some(Duration::from_millis(250)));
    }
}
