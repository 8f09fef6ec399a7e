use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Queue sizing for the query watch subsystem
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatchConfig {
    /// Buffer size of the key-change event queue shared by all shards
    ///
    /// Stores publish with `try_send`; when the queue is full the event is
    /// dropped so the write path never waits on watchers.
    ///
    /// **Default**: 1024
    #[serde(default = "default_event_queue_size")]
    pub event_queue_size: usize,

    /// Buffer size of the subscribe/unsubscribe request queue
    ///
    /// **Default**: 256
    #[serde(default = "default_subscription_queue_size")]
    pub subscription_queue_size: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            event_queue_size: default_event_queue_size(),
            subscription_queue_size: default_subscription_queue_size(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.event_queue_size == 0 {
            return Err(Error::Config(ConfigError::Message(
                "event_queue_size must be greater than 0".into(),
            )));
        }

        if self.subscription_queue_size == 0 {
            return Err(Error::Config(ConfigError::Message(
                "subscription_queue_size must be greater than 0".into(),
            )));
        }

        Ok(())
    }
}

fn default_event_queue_size() -> usize {
    1024
}
fn default_subscription_queue_size() -> usize {
    256
}
