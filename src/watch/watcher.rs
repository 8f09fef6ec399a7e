use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::SubscriptionRegistry;
use super::WatchDispatcher;
use super::WatchEvent;
use super::WatchSubscription;
use crate::ClientTransport;
use crate::QueryExecutor;
use crate::Result;
use crate::ShardManager;

/// Owns the subscription registry and runs both watch loops
#[derive(Debug)]
pub struct QueryWatcher {
    dispatcher: WatchDispatcher,
    event_rx: mpsc::Receiver<WatchEvent>,
    subscription_rx: mpsc::Receiver<WatchSubscription>,
}

impl QueryWatcher {
    pub fn new(
        shards: Arc<ShardManager>,
        executor: Arc<dyn QueryExecutor>,
        transport: Arc<dyn ClientTransport>,
        event_rx: mpsc::Receiver<WatchEvent>,
        subscription_rx: mpsc::Receiver<WatchSubscription>,
    ) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        Self {
            dispatcher: WatchDispatcher::new(registry, shards, executor, transport),
            event_rx,
            subscription_rx,
        }
    }

    pub fn registry(&self) -> Arc<SubscriptionRegistry> {
        self.dispatcher.registry().clone()
    }

    /// Runs the subscription loop and the dispatch loop until `cancel` fires.
    ///
    /// Returns once both loops have finished. Records still queued at
    /// cancellation are not drained.
    pub async fn run(
        self,
        cancel: CancellationToken,
    ) -> Result<()> {
        let Self {
            dispatcher,
            event_rx,
            subscription_rx,
        } = self;

        info!("Query watcher started");

        let subscriptions = tokio::spawn(listen_for_subscriptions(
            dispatcher.registry().clone(),
            subscription_rx,
            cancel.clone(),
        ));
        let events = tokio::spawn(watch_keys(dispatcher, event_rx, cancel));

        let (subscriptions, events) = tokio::join!(subscriptions, events);
        subscriptions?;
        events?;

        info!("Query watcher stopped");
        Ok(())
    }
}

/// Applies subscribe/unsubscribe requests to the registry.
async fn listen_for_subscriptions(
    registry: Arc<SubscriptionRegistry>,
    mut subscription_rx: mpsc::Receiver<WatchSubscription>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Subscription loop received shutdown signal");
                break;
            }
            request = subscription_rx.recv() => {
                let Some(WatchSubscription { subscribe, query, client }) = request else {
                    warn!("Watch subscription channel closed");
                    break;
                };
                if subscribe {
                    registry.add_watcher(query, client);
                } else {
                    registry.remove_watcher(&query, client);
                }
            }
        }
    }
}

/// Dispatches key-change events to watchers in arrival order.
///
/// Each dispatch runs on the blocking pool since socket writes block; the
/// loop awaits it before taking the next event.
async fn watch_keys(
    dispatcher: WatchDispatcher,
    mut event_rx: mpsc::Receiver<WatchEvent>,
    cancel: CancellationToken,
) {
    let dispatcher = Arc::new(dispatcher);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Dispatch loop received shutdown signal");
                break;
            }
            event = event_rx.recv() => {
                let Some(event) = event else {
                    warn!("Watch event channel closed");
                    break;
                };
                let dispatcher = dispatcher.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || dispatcher.dispatch(&event)).await {
                    error!("Watch dispatch task failed: {:?}", e);
                }
            }
        }
    }
}
