//! Memory management and live query notification core of an in-memory
//! key-value store.
//!
//! - [`EvictionController`] frees space when a shard goes over its key limit
//!   (`simple-first`, `allkeys-random`, or sampled `allkeys-lru`).
//! - [`QueryWatcher`] keeps a registry of continuous queries and pushes
//!   re-evaluated results to subscribed clients whenever a matching key changes.

mod config;
mod constants;
mod errors;
mod eviction;
mod metrics;
mod query;
mod storage;
mod transport;
mod watch;
mod wire;
pub mod utils;

pub use config::*;
pub use errors::*;
pub use eviction::*;
pub use metrics::*;
pub use query::*;
pub use storage::*;
pub use transport::*;
pub use utils::*;
pub use watch::*;
pub use wire::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub(crate) mod test_utils;
