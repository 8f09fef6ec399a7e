use tracing::trace;

use crate::time::idle_time;
use crate::Store;

/// Eviction candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolItem {
    pub key: String,
    pub idle_time: u32,
}

/// Bounded set of eviction candidates ranked by idle time.
///
/// Items are kept in ascending idle order so the most idle one is popped off the tail.
#[derive(Debug)]
pub struct EvictionPool {
    items: Vec<PoolItem>,
    capacity: usize,
}

impl EvictionPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Samples up to `sample_size` keys from `store` under its shared lock.
    ///
    /// Keys come in map iteration order, not uniformly at random.
    pub fn populate(
        &mut self,
        store: &Store,
        sample_size: usize,
    ) {
        let mut remaining = sample_size;
        if remaining == 0 {
            return;
        }

        store.with_read_lock(|data| {
            data.iterate(|key, _| {
                // re-fetch: the entry seen during enumeration may be stale
                if let Some(obj) = data.get(key) {
                    self.push(key, obj.last_accessed_at());
                    remaining -= 1;
                }
                remaining > 0
            });
        });

        trace!(
            shard_id = store.shard_id(),
            sampled = self.items.len(),
            "Eviction pool populated"
        );
    }

    /// Adds `key` ranked by its idle time as of now.
    pub fn push(
        &mut self,
        key: &str,
        last_accessed_at: u32,
    ) {
        self.push_with_idle_time(key, idle_time(last_accessed_at));
    }

    pub(crate) fn push_with_idle_time(
        &mut self,
        key: &str,
        idle_time: u32,
    ) {
        if self.capacity == 0 || self.items.iter().any(|item| item.key == key) {
            return;
        }

        if self.items.len() == self.capacity {
            // full: only replace the least idle candidate with a more idle one
            if self.items[0].idle_time >= idle_time {
                return;
            }
            self.items.remove(0);
        }

        let pos = self.items.partition_point(|item| item.idle_time <= idle_time);
        self.items.insert(
            pos,
            PoolItem {
                key: key.to_string(),
                idle_time,
            },
        );
    }

    /// Removes and returns the most idle candidate.
    pub fn pop(&mut self) -> Option<PoolItem> {
        self.items.pop()
    }

    /// Most idle candidate, if any
    pub fn peek(&self) -> Option<&PoolItem> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
