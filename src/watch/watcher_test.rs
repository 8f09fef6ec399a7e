use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tokio::time::sleep;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::test_utils::RecordingTransport;
use crate::ClientHandle;
use crate::KeyPatternExecutor;
use crate::MockClientTransport;
use crate::Query;
use crate::ShardManager;
use crate::StoreConfig;
use crate::WatchConfig;

struct Harness {
    shards: Arc<ShardManager>,
    transport: Arc<RecordingTransport>,
    registry: Arc<SubscriptionRegistry>,
    subscription_tx: tokio::sync::mpsc::Sender<WatchSubscription>,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<crate::Result<()>>,
}

fn start() -> Harness {
    let channels = watch_channels(&WatchConfig::default());
    let shards = Arc::new(ShardManager::new(
        &StoreConfig::default(),
        Some(channels.event_tx.clone()),
    ));
    let transport = Arc::new(RecordingTransport::default());
    let watcher = QueryWatcher::new(
        shards.clone(),
        Arc::new(KeyPatternExecutor),
        transport.clone(),
        channels.event_rx,
        channels.subscription_rx,
    );
    let registry = watcher.registry();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(watcher.run(cancel.clone()));

    Harness {
        shards,
        transport,
        registry,
        subscription_tx: channels.subscription_tx,
        cancel,
        handle,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    timeout(Duration::from_secs(2), async {
        while !condition() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_subscription_loop_applies_requests() {
    let h = start();
    let query = Query::new("user:*");

    h.subscription_tx
        .send(WatchSubscription::subscribe(query.clone(), ClientHandle(1)))
        .await
        .unwrap();
    wait_until(|| h.registry.contains(&query, ClientHandle(1))).await;

    h.subscription_tx
        .send(WatchSubscription::unsubscribe(query.clone(), ClientHandle(1)))
        .await
        .unwrap();
    wait_until(|| !h.registry.contains_query(&query)).await;

    h.cancel.cancel();
    h.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_store_mutation_reaches_subscriber() {
    let h = start();
    let query = Query::new("user:*");
    h.subscription_tx
        .send(WatchSubscription::subscribe(query.clone(), ClientHandle(7)))
        .await
        .unwrap();
    wait_until(|| h.registry.contains(&query, ClientHandle(7))).await;

    h.shards.put("user:42", "alice");
    wait_until(|| h.transport.frames_for(ClientHandle(7)).len() == 1).await;

    h.shards.put("order:1", "x");
    h.shards.del("user:42");
    wait_until(|| h.transport.frames_for(ClientHandle(7)).len() == 2).await;

    h.cancel.cancel();
    h.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_run_returns_promptly_on_cancel() {
    let h = start();
    h.cancel.cancel();

    let result = timeout(Duration::from_secs(1), h.handle).await;
    assert!(result.expect("watcher did not stop").unwrap().is_ok());
}

#[tokio::test]
async fn test_loops_exit_when_channels_close() {
    let channels = watch_channels(&WatchConfig::default());
    let shards = Arc::new(ShardManager::new(&StoreConfig::default(), None));
    let watcher = QueryWatcher::new(
        shards,
        Arc::new(KeyPatternExecutor),
        Arc::new(RecordingTransport::default()),
        channels.event_rx,
        channels.subscription_rx,
    );
    drop(channels.event_tx);
    drop(channels.subscription_tx);

    let result = timeout(Duration::from_secs(1), watcher.run(CancellationToken::new())).await;
    assert!(result.expect("watcher did not stop").is_ok());
}

#[tokio::test]
async fn test_slow_delivery_does_not_stall_subscription_loop() {
    let channels = watch_channels(&WatchConfig::default());
    let shards = Arc::new(ShardManager::new(
        &StoreConfig::default(),
        Some(channels.event_tx.clone()),
    ));
    let mut transport = MockClientTransport::new();
    transport.expect_write().returning(|_, _| {
        std::thread::sleep(Duration::from_millis(1500));
        Ok(())
    });
    let watcher = QueryWatcher::new(
        shards.clone(),
        Arc::new(KeyPatternExecutor),
        Arc::new(transport),
        channels.event_rx,
        channels.subscription_rx,
    );
    let registry = watcher.registry();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(watcher.run(cancel.clone()));

    let query = Query::new("user:*");
    channels
        .subscription_tx
        .send(WatchSubscription::subscribe(query.clone(), ClientHandle(1)))
        .await
        .unwrap();
    wait_until(|| registry.contains(&query, ClientHandle(1))).await;

    // delivery to client 1 now blocks for a while
    shards.put("user:1", "a");
    sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    channels
        .subscription_tx
        .send(WatchSubscription::subscribe(query.clone(), ClientHandle(2)))
        .await
        .unwrap();
    wait_until(|| registry.contains(&query, ClientHandle(2))).await;
    assert!(started.elapsed() < Duration::from_secs(1));

    cancel.cancel();
    handle.await.unwrap().unwrap();
}
