//! In-memory shard storage
//!
//! A [`Store`] is one shard of the key space: a `parking_lot::RwLock` over a
//! hash map of [`Obj`]s. It is the collaborator both the eviction controller
//! and the query watcher operate on:
//! - scoped shared/exclusive lock helpers handing out a [`ShardData`] view
//! - pointer-style deletion taking its own per-key exclusive lock
//! - a key-change event for every observable mutation
//!
//! [`ShardManager`] owns the fixed set of shards and routes keys to them.

mod obj;
mod shard_manager;
mod store;


pub use obj::*;
pub use shard_manager::*;
pub use store::*;
