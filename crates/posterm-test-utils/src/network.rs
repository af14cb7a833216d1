use async_trait::async_trait;
use posterm_link::{ByteQueue, LinkError, Transport};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
enum Chunk {
    Data(Vec<u8>),
    Fail(String),
}

#[derive(Debug, Default)]
struct Shared {
    pending: VecDeque<Chunk>,
    written: Vec<u8>,
}

/// In-memory [`Transport`] fed from a [`MemoryPeer`].
///
/// Each read returns the next scripted chunk. Once the script runs out every
/// read returns `Ok(0)`, like a peer that has gone quiet.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    shared: Arc<Mutex<Shared>>,
}

/// The server end of a [`MemoryTransport`]
#[derive(Debug, Clone)]
pub struct MemoryPeer {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryTransport {
    pub fn pair() -> (MemoryTransport, MemoryPeer) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            MemoryTransport {
                shared: shared.clone(),
            },
            MemoryPeer { shared },
        )
    }
}

impl MemoryPeer {
    /// Queue bytes for the terminal's next read
    pub async fn send(&self, bytes: &[u8]) {
        self.shared
            .lock()
            .await
            .pending
            .push_back(Chunk::Data(bytes.to_vec()));
    }

    /// Queue a failed read
    pub async fn fail(&self, reason: &str) {
        self.shared
            .lock()
            .await
            .pending
            .push_back(Chunk::Fail(reason.to_string()));
    }

    /// Everything the terminal has written so far
    pub async fn written(&self) -> Vec<u8> {
        self.shared.lock().await.written.clone()
    }

    /// Take what the terminal has written so far
    pub async fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.shared.lock().await.written)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read(&mut self, inbound: &mut ByteQueue) -> Result<usize, LinkError> {
        let next = self.shared.lock().await.pending.pop_front();
        match next {
            Some(Chunk::Data(bytes)) => {
                inbound.extend(&bytes);
                Ok(bytes.len())
            }
            Some(Chunk::Fail(reason)) => Err(LinkError::TransportError(reason)),
            None => Ok(0),
        }
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<usize, LinkError> {
        self.shared.lock().await.written.extend_from_slice(bytes);
        Ok(bytes.len())
    }
}
