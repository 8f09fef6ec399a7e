use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::trace;
use tracing::warn;

use super::wildcard_match;
use super::SubscriptionRegistry;
use super::WatchEvent;
use crate::encode_push_response;
use crate::execute_on_owning_shards;
use crate::ClientTransport;
use crate::PushResponse;
use crate::QueryExecutor;
use crate::ShardManager;
use crate::WATCH_DELIVERY_FAILURES;
use crate::WATCH_EVENTS_DISPATCHED;
use crate::WATCH_PUSHES_DELIVERED;
use crate::WATCH_QUERY_ERRORS;

/// Turns one key-change event into push frames for every matching watched query
pub struct WatchDispatcher {
    registry: Arc<SubscriptionRegistry>,
    shards: Arc<ShardManager>,
    executor: Arc<dyn QueryExecutor>,
    transport: Arc<dyn ClientTransport>,
}

impl std::fmt::Debug for WatchDispatcher {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("WatchDispatcher")
            .field("registry", &self.registry)
            .field("shards", &self.shards.shard_count())
            .finish_non_exhaustive()
    }
}

impl WatchDispatcher {
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        shards: Arc<ShardManager>,
        executor: Arc<dyn QueryExecutor>,
        transport: Arc<dyn ClientTransport>,
    ) -> Self {
        Self {
            registry,
            shards,
            executor,
            transport,
        }
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Delivers `event` to watchers and returns the number of frames written.
    ///
    /// A failing query only skips that query. A failing client write is taken as
    /// a disconnect and unsubscribes that client from that query, without retry.
    pub fn dispatch(
        &self,
        event: &WatchEvent,
    ) -> usize {
        WATCH_EVENTS_DISPATCHED.inc();
        let mut delivered = 0;

        for (query, clients) in self.registry.snapshot() {
            if !wildcard_match(&query.key_regex, &event.key) {
                continue;
            }

            let result = match execute_on_owning_shards(self.executor.as_ref(), &self.shards, &query) {
                Ok(result) => result,
                Err(e) => {
                    WATCH_QUERY_ERRORS.inc();
                    error!(
                        query = %query,
                        key = %event.key,
                        "Watched query execution failed: {:?}",
                        e
                    );
                    continue;
                }
            };

            let frame = encode_push_response(&PushResponse::new(&query, result));

            for client in clients {
                match self.transport.write(client, &frame) {
                    Ok(()) => {
                        delivered += 1;
                        WATCH_PUSHES_DELIVERED.inc();
                    }
                    Err(e) => {
                        WATCH_DELIVERY_FAILURES.inc();
                        warn!(
                            client = %client,
                            query = %query,
                            "Push delivery failed, unsubscribing client: {}",
                            e
                        );
                        self.registry.remove_watcher(&query, client);
                    }
                }
            }
        }

        if delivered > 0 {
            debug!(key = %event.key, operation = %event.operation, delivered, "Event dispatched");
        } else {
            trace!(key = %event.key, operation = %event.operation, "Event matched no watcher");
        }
        delivered
    }
}
