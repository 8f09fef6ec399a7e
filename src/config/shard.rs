use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShardConfig {
    /// Number of independent stores keys are partitioned across
    ///
    /// **Default**: 1
    #[serde(default = "default_shard_count")]
    pub shard_count: usize,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            shard_count: default_shard_count(),
        }
    }
}

impl ShardConfig {
    pub fn validate(&self) -> Result<()> {
        if self.shard_count == 0 {
            return Err(Error::Config(ConfigError::Message(
                "shard_count must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_shard_count() -> usize {
    1
}
