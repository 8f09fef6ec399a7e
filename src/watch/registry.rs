use std::collections::HashSet;

use dashmap::DashMap;
use tracing::trace;

use crate::ClientHandle;
use crate::Query;
use crate::WATCHED_QUERIES;

/// Watched query -> subscribed clients
///
/// A query is present iff at least one client watches it. Each client set is
/// only touched while holding its DashMap shard lock, so adds and removes for
/// one query are linearized.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    watchers: DashMap<Query, HashSet<ClientHandle>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `client` to `query`. Returns `false` if it was already subscribed.
    pub fn add_watcher(
        &self,
        query: Query,
        client: ClientHandle,
    ) -> bool {
        let added = self.watchers.entry(query.clone()).or_default().insert(client);
        WATCHED_QUERIES.set(self.watchers.len() as i64);

        trace!(client = %client, query = %query, added, "Watcher added");
        added
    }

    /// Unsubscribes `client` from `query`, dropping the query once nobody watches it.
    ///
    /// Removing an unknown client or query is a no-op. Returns whether the client was removed.
    pub fn remove_watcher(
        &self,
        query: &Query,
        client: ClientHandle,
    ) -> bool {
        let mut removed = false;
        // check and removal of the empty set happen under the same shard lock
        self.watchers.remove_if_mut(query, |_, clients| {
            removed = clients.remove(&client);
            clients.is_empty()
        });
        WATCHED_QUERIES.set(self.watchers.len() as i64);

        trace!(client = %client, query = %query, removed, "Watcher removed");
        removed
    }

    pub fn contains(
        &self,
        query: &Query,
        client: ClientHandle,
    ) -> bool {
        self.watchers
            .get(query)
            .map(|clients| clients.contains(&client))
            .unwrap_or(false)
    }

    pub fn contains_query(
        &self,
        query: &Query,
    ) -> bool {
        self.watchers.contains_key(query)
    }

    /// Clients currently watching `query`
    pub fn clients(
        &self,
        query: &Query,
    ) -> Vec<ClientHandle> {
        self.watchers
            .get(query)
            .map(|clients| clients.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn client_count(
        &self,
        query: &Query,
    ) -> usize {
        self.watchers.get(query).map(|clients| clients.len()).unwrap_or(0)
    }

    pub fn query_count(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    /// Point-in-time copy of every query and its clients.
    ///
    /// No lock is held once this returns, so callers may mutate the registry
    /// while walking the snapshot.
    pub fn snapshot(&self) -> Vec<(Query, Vec<ClientHandle>)> {
        self.watchers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().iter().copied().collect()))
            .collect()
    }
}
