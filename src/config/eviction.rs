use std::fmt;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_LRU_SAMPLE_SIZE;
use crate::Error;
use crate::Result;

/// Victim selection policy applied when the store exceeds `keys_limit`
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EvictionPolicy {
    /// Delete the first key found while iterating
    SimpleFirst,
    /// Delete a fraction of the capacity in native iteration order
    AllkeysRandom,
    /// Approximated LRU through a sampled eviction pool
    #[default]
    AllkeysLru,
}

impl EvictionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::SimpleFirst => "simple-first",
            EvictionPolicy::AllkeysRandom => "allkeys-random",
            EvictionPolicy::AllkeysLru => "allkeys-lru",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EvictionConfig {
    /// Which eviction strategy to run
    ///
    /// **Default**: `allkeys-lru`
    #[serde(default)]
    pub policy: EvictionPolicy,

    /// Fraction of `keys_limit` removed per eviction cycle, in (0, 1]
    ///
    /// Only used by `allkeys-random` and `allkeys-lru`.
    ///
    /// **Default**: 0.1
    #[serde(default = "default_eviction_ratio")]
    pub eviction_ratio: f64,

    /// Maximum number of keys a shard may hold before eviction kicks in
    ///
    /// **Default**: 10000
    #[serde(default = "default_keys_limit")]
    pub keys_limit: u64,

    /// Number of keys sampled into the LRU eviction pool per cycle
    ///
    /// **Default**: 5
    #[serde(default = "default_lru_sample_size")]
    pub lru_sample_size: usize,
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            policy: EvictionPolicy::default(),
            eviction_ratio: default_eviction_ratio(),
            keys_limit: default_keys_limit(),
            lru_sample_size: default_lru_sample_size(),
        }
    }
}

impl EvictionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.eviction_ratio > 0.0 && self.eviction_ratio <= 1.0) {
            return Err(Error::Config(ConfigError::Message(format!(
                "eviction_ratio must be in (0, 1], got {}",
                self.eviction_ratio
            ))));
        }

        if self.keys_limit == 0 {
            return Err(Error::Config(ConfigError::Message(
                "keys_limit must be greater than 0".into(),
            )));
        }

        if self.lru_sample_size == 0 {
            return Err(Error::Config(ConfigError::Message(
                "lru_sample_size must be greater than 0".into(),
            )));
        }

        Ok(())
    }

    /// Number of keys a ratio-based strategy removes per cycle:
    /// `floor(eviction_ratio * keys_limit)`, never less than one.
    pub fn evict_count(&self) -> usize {
        let count = (self.eviction_ratio * self.keys_limit as f64).floor() as usize;
        count.max(1)
    }
}

fn default_eviction_ratio() -> f64 {
    0.1
}
fn default_keys_limit() -> u64 {
    10_000
}
fn default_lru_sample_size() -> usize {
    DEFAULT_LRU_SAMPLE_SIZE
}
