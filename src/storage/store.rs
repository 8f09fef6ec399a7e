use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::debug;
use tracing::trace;

use super::Obj;
use crate::EvictionConfig;
use crate::EvictionController;
use crate::WatchEventSender;
use crate::WatchOperation;

/// Key space of one shard, only reachable through [`Store`]'s lock scopes
#[derive(Debug, Default)]
pub struct ShardData {
    entries: HashMap<String, Obj>,
}

impl ShardData {
    /// Visits entries in the map's native order until `visitor` returns `false`.
    pub fn iterate<F>(
        &self,
        mut visitor: F,
    ) where
        F: FnMut(&str, &Obj) -> bool,
    {
        for (key, obj) in self.entries.iter() {
            if !visitor(key, obj) {
                break;
            }
        }
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Obj> {
        self.entries.get(key)
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes the entry stored under `key`, if any.
    pub fn del_by_ptr(
        &mut self,
        key: &str,
    ) -> Option<Obj> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(
        &mut self,
        key: String,
        obj: Obj,
    ) -> Option<Obj> {
        self.entries.insert(key, obj)
    }
}

/// One shard of the key-value store
#[derive(Debug)]
pub struct Store {
    shard_id: usize,
    data: RwLock<ShardData>,
    eviction: EvictionController,
    watch_tx: Option<WatchEventSender>,
}

impl Store {
    pub fn new(
        shard_id: usize,
        eviction: EvictionConfig,
        watch_tx: Option<WatchEventSender>,
    ) -> Self {
        Self {
            shard_id,
            data: RwLock::new(ShardData::default()),
            eviction: EvictionController::new(eviction),
            watch_tx,
        }
    }

    pub fn shard_id(&self) -> usize {
        self.shard_id
    }

    pub fn eviction(&self) -> &EvictionController {
        &self.eviction
    }

    /// Inserts or replaces `key`, then evicts if the shard went over its key limit.
    pub fn put(
        &self,
        key: impl Into<String>,
        value: impl Into<Bytes>,
    ) {
        let key = key.into();
        {
            let mut data = self.data.write();
            data.insert(key.clone(), Obj::new(value.into()));
        }
        trace!(shard_id = self.shard_id, key = %key, "put");
        self.notify(key, WatchOperation::Set);

        if self.is_over_capacity() {
            debug!(
                shard_id = self.shard_id,
                keys = self.key_count(),
                keys_limit = self.eviction.config().keys_limit,
                "Store over capacity, evicting"
            );
            self.evict();
        }
    }

    /// Returns the value of `key` and refreshes its access clock.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<Bytes> {
        let data = self.data.read();
        data.get(key).map(|obj| {
            obj.touch();
            obj.value().clone()
        })
    }

    /// Deletes `key`. Returns whether it existed.
    pub fn del(
        &self,
        key: &str,
    ) -> bool {
        self.del_by_ptr(key)
    }

    /// Deletes `key` under a short exclusive lock held only for this key.
    pub fn del_by_ptr(
        &self,
        key: &str,
    ) -> bool {
        let removed = self.data.write().del_by_ptr(key).is_some();
        if removed {
            self.notify(key.to_string(), WatchOperation::Delete);
        }
        removed
    }

    pub fn key_count(&self) -> usize {
        self.data.read().len()
    }

    /// `true` once the key count exceeds the configured limit.
    pub fn is_over_capacity(&self) -> bool {
        self.key_count() as u64 > self.eviction.config().keys_limit
    }

    /// Runs the configured eviction strategy once.
    pub fn evict(&self) {
        self.eviction.evict(self);
    }

    /// Runs `f` while holding the shard-wide exclusive lock.
    pub fn with_write_lock<R>(
        &self,
        f: impl FnOnce(&mut ShardData) -> R,
    ) -> R {
        let mut data = self.data.write();
        f(&mut data)
    }

    /// Runs `f` while holding the shard-wide shared lock.
    pub fn with_read_lock<R>(
        &self,
        f: impl FnOnce(&ShardData) -> R,
    ) -> R {
        let data = self.data.read();
        f(&data)
    }

    /// Publishes a key-change event. Never blocks.
    pub(crate) fn notify(
        &self,
        key: String,
        operation: WatchOperation,
    ) {
        if let Some(tx) = &self.watch_tx {
            tx.notify(key, operation);
        }
    }
}
