use std::fmt;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::trace;
use tracing::warn;

use crate::ClientHandle;
use crate::Query;
use crate::WatchConfig;

/// Kind of mutation that produced a [`WatchEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOperation {
    /// Key inserted or overwritten
    Set,
    /// Key deleted, explicitly or by eviction
    Delete,
}

impl WatchOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchOperation::Set => "SET",
            WatchOperation::Delete => "DEL",
        }
    }
}

impl fmt::Display for WatchOperation {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub key: String,
    pub operation: WatchOperation,
}

/// One-shot request to start or stop watching a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSubscription {
    /// `true` to subscribe, `false` to unsubscribe
    pub subscribe: bool,
    pub query: Query,
    pub client: ClientHandle,
}

impl WatchSubscription {
    pub fn subscribe(
        query: Query,
        client: ClientHandle,
    ) -> Self {
        Self {
            subscribe: true,
            query,
            client,
        }
    }

    pub fn unsubscribe(
        query: Query,
        client: ClientHandle,
    ) -> Self {
        Self {
            subscribe: false,
            query,
            client,
        }
    }
}

/// Producer side of the key-change event queue, handed to every shard
#[derive(Debug, Clone)]
pub struct WatchEventSender {
    tx: mpsc::Sender<WatchEvent>,
}

impl WatchEventSender {
    pub fn new(tx: mpsc::Sender<WatchEvent>) -> Self {
        Self { tx }
    }

    /// Publishes a key change without blocking; drops it if the queue is full.
    pub fn notify(
        &self,
        key: String,
        operation: WatchOperation,
    ) {
        match self.tx.try_send(WatchEvent { key, operation }) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(
                    key = %event.key,
                    operation = %event.operation,
                    "Watch event queue full, dropping event"
                );
            }
            Err(TrySendError::Closed(event)) => {
                trace!(key = %event.key, "Watch event queue closed");
            }
        }
    }
}

/// Both inbound queues of a [`QueryWatcher`](crate::QueryWatcher)
#[derive(Debug)]
pub struct WatchChannels {
    pub event_tx: WatchEventSender,
    pub event_rx: mpsc::Receiver<WatchEvent>,
    pub subscription_tx: mpsc::Sender<WatchSubscription>,
    pub subscription_rx: mpsc::Receiver<WatchSubscription>,
}

/// Creates the bounded event and subscription queues.
pub fn watch_channels(config: &WatchConfig) -> WatchChannels {
    let (event_tx, event_rx) = mpsc::channel(config.event_queue_size);
    let (subscription_tx, subscription_rx) = mpsc::channel(config.subscription_queue_size);

    WatchChannels {
        event_tx: WatchEventSender::new(event_tx),
        event_rx,
        subscription_tx,
        subscription_rx,
    }
}
