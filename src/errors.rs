//! Store Error Hierarchy
//!
//! Eviction is advisory and never surfaces errors. Everything that can fail
//! (configuration, query re-execution, client delivery, background tasks) is
//! categorized here so callers can contain failures at the smallest scope.

use config::ConfigError;
use tokio::task::JoinError;

use crate::ClientHandle;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Watched query re-execution failures
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Push delivery failures towards a subscribed client
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid key pattern: {0:?}")]
    InvalidPattern(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// No socket registered for the client (already disconnected)
    #[error("Client {0} is not connected")]
    UnknownClient(ClientHandle),

    /// Socket write failed
    #[error("Write to client {client} failed: {source}")]
    Io {
        client: ClientHandle,
        #[source]
        source: std::io::Error,
    },
}
