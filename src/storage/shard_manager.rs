use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use super::Store;
use crate::StoreConfig;
use crate::WatchEventSender;

/// Fixed set of shards, keys routed by a stable hash
#[derive(Debug)]
pub struct ShardManager {
    shards: Vec<Arc<Store>>,
}

impl ShardManager {
    pub fn new(
        config: &StoreConfig,
        watch_tx: Option<WatchEventSender>,
    ) -> Self {
        let shard_count = config.shard.shard_count.max(1);
        let shards = (0..shard_count)
            .map(|id| Arc::new(Store::new(id, config.eviction.clone(), watch_tx.clone())))
            .collect();

        info!(
            shard_count,
            policy = %config.eviction.policy,
            keys_limit = config.eviction.keys_limit,
            "Shards initialized"
        );

        Self { shards }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn shard(
        &self,
        shard_id: usize,
    ) -> Option<&Arc<Store>> {
        self.shards.get(shard_id)
    }

    pub fn shards(&self) -> &[Arc<Store>] {
        &self.shards
    }

    pub fn shard_id_for_key(
        &self,
        key: &str,
    ) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    /// Shard owning `key`
    pub fn shard_for_key(
        &self,
        key: &str,
    ) -> &Arc<Store> {
        &self.shards[self.shard_id_for_key(key)]
    }

    pub fn put(
        &self,
        key: impl Into<String>,
        value: impl Into<Bytes>,
    ) {
        let key = key.into();
        self.shard_for_key(&key).put(key, value);
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<Bytes> {
        self.shard_for_key(key).get(key)
    }

    pub fn del(
        &self,
        key: &str,
    ) -> bool {
        self.shard_for_key(key).del(key)
    }

    /// Total number of keys across all shards
    pub fn key_count(&self) -> usize {
        self.shards.iter().map(|s| s.key_count()).sum()
    }
}
