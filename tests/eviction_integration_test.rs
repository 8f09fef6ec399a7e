use std::sync::Arc;
use std::thread;

use d_store::EvictionConfig;
use d_store::EvictionPolicy;
use d_store::ShardManager;
use d_store::StoreConfig;

fn config(
    policy: EvictionPolicy,
    keys_limit: u64,
) -> StoreConfig {
    let mut config = StoreConfig::default();
    config.eviction = EvictionConfig {
        policy,
        eviction_ratio: 0.1,
        keys_limit,
        lru_sample_size: 5,
    };
    config
}

#[test]
fn test_each_shard_stays_within_limit() {
    for policy in [
        EvictionPolicy::SimpleFirst,
        EvictionPolicy::AllkeysRandom,
        EvictionPolicy::AllkeysLru,
    ] {
        let mut config = config(policy, 50);
        config.shard.shard_count = 2;
        let shards = ShardManager::new(&config, None);

        for i in 0..1_000 {
            shards.put(format!("key:{i}"), "v");
        }

        for store in shards.shards() {
            assert!(
                store.key_count() <= 50,
                "{policy}: shard {} holds {} keys",
                store.shard_id(),
                store.key_count()
            );
        }
    }
}

#[test]
fn test_concurrent_writers_and_readers_with_lru_eviction() {
    let shards = Arc::new(ShardManager::new(&config(EvictionPolicy::AllkeysLru, 100), None));

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let shards = shards.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    shards.put(format!("w{t}:{i}"), "v");
                }
            })
        })
        .collect();
    let readers: Vec<_> = (0..2)
        .map(|t| {
            let shards = shards.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    let _ = shards.get(&format!("w{t}:{i}"));
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    // racing cycles may sample the same victims, so allow a small overshoot
    assert!(shards.key_count() <= 120, "{} keys left", shards.key_count());

    let store = shards.shard(0).unwrap();
    while store.is_over_capacity() {
        store.evict();
    }
    assert!(store.key_count() <= 100);
}
