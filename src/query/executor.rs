#[cfg(test)]
use mockall::automock;
use tracing::trace;

use super::Query;
use super::QueryResult;
use crate::wildcard_match;
use crate::QueryError;
use crate::Result;
use crate::ShardManager;
use crate::Store;

/// Runs a watched query against one shard.
#[cfg_attr(test, automock)]
pub trait QueryExecutor: Send + Sync + 'static {
    fn execute(
        &self,
        query: &Query,
        store: &Store,
    ) -> Result<QueryResult>;
}

/// Scans the shard under its shared lock and keeps keys matching the pattern.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyPatternExecutor;

impl QueryExecutor for KeyPatternExecutor {
    fn execute(
        &self,
        query: &Query,
        store: &Store,
    ) -> Result<QueryResult> {
        if query.key_regex.is_empty() {
            return Err(QueryError::InvalidPattern(query.key_regex.clone()).into());
        }

        let mut result = store.with_read_lock(|data| {
            let mut rows = Vec::new();
            data.iterate(|key, obj| {
                if wildcard_match(&query.key_regex, key) {
                    rows.push((key.to_string(), obj.value().clone()));
                }
                true
            });
            QueryResult { rows }
        });
        result.shape(query);

        trace!(
            shard_id = store.shard_id(),
            query = %query,
            rows = result.rows.len(),
            "Query executed"
        );
        Ok(result)
    }
}

/// Executes `query` on the shard(s) owning its data.
///
/// An exact-key pattern lives on exactly one shard. A wildcard pattern may
/// match keys on any shard, so every shard is queried and the parts merged.
pub fn execute_on_owning_shards(
    executor: &dyn QueryExecutor,
    shards: &ShardManager,
    query: &Query,
) -> Result<QueryResult> {
    if query.is_exact_key() {
        return executor.execute(query, shards.shard_for_key(&query.key_regex));
    }

    let parts = shards
        .shards()
        .iter()
        .map(|store| executor.execute(query, store))
        .collect::<Result<Vec<_>>>()?;
    Ok(QueryResult::merge(query, parts))
}
