//! Client transport used to deliver push frames.
//!
//! The only feedback is whether a write succeeded: a failed write means the
//! client is gone.


use std::fmt;
use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
#[cfg(test)]
use mockall::automock;
use tracing::debug;
use tracing::warn;

use crate::constants::DEFAULT_CLIENT_WRITE_TIMEOUT;
use crate::DeliveryError;

/// Opaque identifier of a connected client (e.g. its socket descriptor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientHandle(pub u64);

impl fmt::Display for ClientHandle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ClientHandle {
    fn from(id: u64) -> Self {
        ClientHandle(id)
    }
}

#[cfg_attr(test, automock)]
pub trait ClientTransport: Send + Sync + 'static {
    /// Writes a whole frame to `client`'s socket.
    fn write(
        &self,
        client: ClientHandle,
        frame: &[u8],
    ) -> std::result::Result<(), DeliveryError>;
}

/// Blocking TCP transport keyed by client handle
///
/// Writes run on a cloned socket handle outside the map lock, so a client
/// that stops reading never blocks `register`/`deregister`. Each write is
/// bounded by the configured write timeout.
#[derive(Debug)]
pub struct SocketTransport {
    sockets: DashMap<ClientHandle, Arc<TcpStream>>,
    write_timeout: Duration,
}

impl Default for SocketTransport {
    fn default() -> Self {
        Self::with_write_timeout(DEFAULT_CLIENT_WRITE_TIMEOUT)
    }
}

impl SocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_write_timeout(write_timeout: Duration) -> Self {
        Self {
            sockets: DashMap::new(),
            write_timeout,
        }
    }

    /// Attaches `stream` to `client`, replacing any previous socket.
    pub fn register(
        &self,
        client: ClientHandle,
        stream: TcpStream,
    ) {
        if let Err(e) = stream.set_write_timeout(Some(self.write_timeout)) {
            warn!(client = %client, "Failed to set socket write timeout: {:?}", e);
        }
        debug!(client = %client, "Client socket registered");
        self.sockets.insert(client, Arc::new(stream));
    }

    pub fn deregister(
        &self,
        client: ClientHandle,
    ) -> Option<Arc<TcpStream>> {
        self.sockets.remove(&client).map(|(_, stream)| stream)
    }

    pub fn is_connected(
        &self,
        client: ClientHandle,
    ) -> bool {
        self.sockets.contains_key(&client)
    }

    pub fn connection_count(&self) -> usize {
        self.sockets.len()
    }
}

impl ClientTransport for SocketTransport {
    fn write(
        &self,
        client: ClientHandle,
        frame: &[u8],
    ) -> std::result::Result<(), DeliveryError> {
        let stream = self
            .sockets
            .get(&client)
            .map(|entry| entry.value().clone())
            .ok_or(DeliveryError::UnknownClient(client))?;

        let mut writer: &TcpStream = &stream;
        writer
            .write_all(frame)
            .and_then(|_| writer.flush())
            .map_err(|source| DeliveryError::Io { client, source })
    }
}
