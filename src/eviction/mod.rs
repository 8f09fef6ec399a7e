//! Capacity management for a single shard.
//!
//! Three strategies, chosen by [`EvictionPolicy`]:
//!
//! | policy           | lock scope                            | victims                               |
//! |------------------|---------------------------------------|---------------------------------------|
//! | `simple-first`   | shard-wide exclusive                  | first key in iteration order          |
//! | `allkeys-random` | shard-wide exclusive                  | `evict_count` keys in native order    |
//! | `allkeys-lru`    | shared while sampling, per-key delete | most idle keys of a sampled pool      |
//!
//! Eviction is advisory: nothing here reports errors and a cycle that
//! finds no keys is a no-op.

mod pool;


pub use pool::*;
use tracing::debug;

use crate::EvictionConfig;
use crate::EvictionPolicy;
use crate::Store;
use crate::WatchOperation;
use crate::EVICTED_KEYS;

#[derive(Debug, Clone)]
pub struct EvictionController {
    config: EvictionConfig,
}

impl EvictionController {
    pub fn new(config: EvictionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvictionConfig {
        &self.config
    }

    /// Runs the configured strategy against `store` and returns how many keys were removed.
    pub fn evict(
        &self,
        store: &Store,
    ) -> usize {
        let evicted = match self.config.policy {
            EvictionPolicy::SimpleFirst => self.evict_first(store),
            EvictionPolicy::AllkeysRandom => self.evict_allkeys_random(store),
            EvictionPolicy::AllkeysLru => self.evict_allkeys_lru(store),
        };

        EVICTED_KEYS
            .with_label_values(&[self.config.policy.as_str()])
            .inc_by(evicted as u64);
        debug!(
            shard_id = store.shard_id(),
            policy = %self.config.policy,
            evicted,
            "Eviction cycle finished"
        );
        evicted
    }

    /// Deletes the first key found while iterating.
    fn evict_first(
        &self,
        store: &Store,
    ) -> usize {
        let victims = store.with_write_lock(|data| {
            let mut first = None;
            data.iterate(|key, _| {
                first = Some(key.to_string());
                false
            });
            first.into_iter().filter(|key| data.del_by_ptr(key).is_some()).collect::<Vec<_>>()
        });

        Self::publish_deletes(store, victims)
    }

    /// Deletes `evict_count` keys in map iteration order.
    ///
    /// Iteration order depends on key hashes, which is taken as random enough.
    fn evict_allkeys_random(
        &self,
        store: &Store,
    ) -> usize {
        let mut evict_count = self.config.evict_count();

        let victims = store.with_write_lock(|data| {
            let mut victims = Vec::with_capacity(evict_count.min(data.len()));
            data.iterate(|key, _| {
                victims.push(key.to_string());
                evict_count -= 1;
                evict_count > 0
            });
            victims.retain(|key| data.del_by_ptr(key).is_some());
            victims
        });

        Self::publish_deletes(store, victims)
    }

    /// Approximated LRU: sample once into a fresh pool, then delete the most idle
    /// candidates one by one.
    ///
    /// The pool is not refilled while popping, so at most `lru_sample_size` keys go
    /// per cycle and quality degrades the more keys one cycle evicts.
    fn evict_allkeys_lru(
        &self,
        store: &Store,
    ) -> usize {
        let mut pool = EvictionPool::new(self.config.lru_sample_size);
        pool.populate(store, self.config.lru_sample_size);

        let evict_count = self.config.evict_count();
        let mut evicted = 0;
        for _ in 0..evict_count {
            let Some(item) = pool.pop() else {
                break;
            };
            if store.del_by_ptr(&item.key) {
                evicted += 1;
            }
        }
        evicted
    }

    /// Emits delete events for keys removed under the shard-wide lock, after the lock is gone.
    fn publish_deletes(
        store: &Store,
        victims: Vec<String>,
    ) -> usize {
        let evicted = victims.len();
        for key in victims {
            store.notify(key, WatchOperation::Delete);
        }
        evicted
    }
}
