use std::collections::HashSet;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::ClientHandle;
use crate::ClientTransport;
use crate::DeliveryError;

/// Transport that records every frame and fails writes for clients marked as broken
#[derive(Debug, Default)]
pub(crate) struct RecordingTransport {
    frames: Mutex<Vec<(ClientHandle, Bytes)>>,
    broken: Mutex<HashSet<ClientHandle>>,
}

impl RecordingTransport {
    pub(crate) fn break_client(
        &self,
        client: ClientHandle,
    ) {
        self.broken.lock().insert(client);
    }

    pub(crate) fn frames_for(
        &self,
        client: ClientHandle,
    ) -> Vec<Bytes> {
        self.frames
            .lock()
            .iter()
            .filter(|(c, _)| *c == client)
            .map(|(_, frame)| frame.clone())
            .collect()
    }

    pub(crate) fn frame_count(&self) -> usize {
        self.frames.lock().len()
    }
}

impl ClientTransport for RecordingTransport {
    fn write(
        &self,
        client: ClientHandle,
        frame: &[u8],
    ) -> std::result::Result<(), DeliveryError> {
        if self.broken.lock().contains(&client) {
            return Err(DeliveryError::Io {
                client,
                source: std::io::Error::from(std::io::ErrorKind::BrokenPipe),
            });
        }
        self.frames.lock().push((client, Bytes::copy_from_slice(frame)));
        Ok(())
    }
}
