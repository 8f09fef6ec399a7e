//! Reactive query watch mechanism
//!
//! Clients register a continuous [`Query`](crate::Query) and receive a push
//! frame every time a key matching its pattern changes.
//!
//! # Architecture
//!
//! ```text
//! Store::put / del / evict
//!   └─> WatchEventSender::notify() [try_send, never blocks]
//!         │
//!         ▼
//!   ┌──────────────┐      ┌────────────────────┐
//!   │ event queue  │      │ subscription queue │ <── client handlers
//!   └──────┬───────┘      └─────────┬──────────┘
//!          │                        │
//!          ▼                        ▼
//!   WatchDispatcher          SubscriptionRegistry::add/remove_watcher
//!     snapshot registry
//!     key pattern pre-filter
//!     re-execute query on owning shard(s)
//!     encode push frame
//!     write to every subscriber (failed write => unsubscribe)
//! ```
//!
//! Both loops are owned by [`QueryWatcher`] and stop on a shared
//! `CancellationToken`. Pending events are not drained on shutdown.

mod dispatcher;
mod events;
mod pattern;
mod registry;
mod watcher;

#[cfg(test)]
mod watcher_test;

pub use dispatcher::*;
pub use events::*;
pub use pattern::*;
pub use registry::*;
pub use watcher::*;
