//! Timing and queue sizing knobs.

use std::time::Duration;

use serde::Deserialize;

use crate::connection::{DEFAULT_IDLE_TIMEOUT, DEFAULT_QUEUE_CAPACITY, DEFAULT_RECONNECT_DELAY};
use crate::poller::DEFAULT_POLL_INTERVAL;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Fixed delay between dial attempts
    pub reconnect_delay_secs: u64,
    /// Silence from the server that forces a reconnect
    pub idle_timeout_secs: u64,
    /// Delay between two fetches of the same feed
    pub poll_interval_secs: u64,
    /// Pause before each announcement, multiplied by the number of channels
    pub announce_delay_secs: u64,
    /// Capacity of the inbound event queue
    pub event_queue: usize,
    /// Capacity of the outbound command queue
    pub command_queue: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: DEFAULT_RECONNECT_DELAY.as_secs(),
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT.as_secs(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            announce_delay_secs: 1,
            event_queue: DEFAULT_QUEUE_CAPACITY,
            command_queue: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl TimingConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn announce_delay(&self) -> Duration {
        Duration::from_secs(self.announce_delay_secs)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        let durations = [
            ("reconnect_delay_secs", self.reconnect_delay_secs),
            ("idle_timeout_secs", self.idle_timeout_secs),
            ("poll_interval_secs", self.poll_interval_secs),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, v)| *v == 0) {
            return Err(format!("timing.{name} must be greater than zero"));
        }
        if self.event_queue == 0 || self.command_queue == 0 {
            return Err("timing queue capacities must be at least 1".into());
        }
        Ok(())
    }
}
