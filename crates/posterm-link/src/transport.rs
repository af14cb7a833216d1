//! Transport plumbing for posterm
//!
//! The terminal speaks to exactly one server over one byte stream. The
//! [`Transport`] trait is the seam between the engine and the socket: it
//! appends whatever arrived to the inbound queue and writes whatever the
//! outbound queue holds.

use crate::queue::ByteQueue;
use crate::schema::{Command, Direction, Registry};
use crate::LinkError;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Consecutive empty or failed reads after which the server is treated as
/// gone
pub const MAX_READ_FAILURES: u32 = 8;

/// Bytes reserved in the inbound queue before each read
const READ_CHUNK: usize = 4096;

/// One logical connection to the server
#[async_trait]
pub trait Transport: Send {
    /// Append the bytes that have arrived to `inbound` and return how many.
    /// `Ok(0)` means the peer sent nothing (closed or idle).
    async fn read(&mut self, inbound: &mut ByteQueue) -> Result<usize, LinkError>;

    /// Write some prefix of `bytes`, returning its length
    async fn write(&mut self, bytes: &[u8]) -> Result<usize, LinkError>;
}

/// [`Transport`] over any tokio byte stream
pub struct StreamTransport<S> {
    stream: S,
}

impl<S> StreamTransport<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read(&mut self, inbound: &mut ByteQueue) -> Result<usize, LinkError> {
        let buf = inbound.buf_mut();
        buf.reserve(READ_CHUNK);
        let n = self.stream.read_buf(buf).await?;
        Ok(n)
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<usize, LinkError> {
        let n = self.stream.write(bytes).await?;
        self.stream.flush().await?;
        Ok(n)
    }
}

/// Connect to the server at `addr`.
///
/// An address starting with `/` is taken as a Unix socket path, anything
/// else as `host:port`.
pub async fn connect(addr: &str) -> Result<Box<dyn Transport>, LinkError> {
    if addr.starts_with('/') {
        #[cfg(unix)]
        {
            let stream = tokio::net::UnixStream::connect(addr).await.map_err(|e| {
                LinkError::TransportError(format!("Failed to connect to {addr}: {e}"))
            })?;
            info!("Connected to unix socket {}", addr);
            return Ok(Box::new(StreamTransport::new(stream)));
        }
        #[cfg(not(unix))]
        {
            return Err(LinkError::TransportError(format!(
                "Unix sockets unsupported on this platform: {addr}"
            )));
        }
    }

    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| LinkError::TransportError(format!("Failed to connect to {addr}: {e}")))?;
    stream.set_nodelay(true)?;
    info!("Connected to {}", addr);
    Ok(Box::new(StreamTransport::new(stream)))
}

/// Traffic counters for debugging
#[derive(Debug, Default, Clone)]
pub struct LinkStats {
    pub commands_sent: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// The inbound and outbound queues of the connection
#[derive(Debug, Default)]
pub struct Link {
    /// Bytes from the server, drained by the interpreter
    pub inbound: ByteQueue,
    /// Commands for the server, drained by [`flush`](Self::flush)
    pub outbound: ByteQueue,
    stats: LinkStats,
}

impl Link {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    /// Read what the transport has into the inbound queue
    pub async fn fill(&mut self, transport: &mut dyn Transport) -> Result<usize, LinkError> {
        let n = transport.read(&mut self.inbound).await?;
        self.stats.bytes_received += n as u64;
        Ok(n)
    }

    /// Queue `command` for the server
    pub fn send(&mut self, registry: &Registry, command: &Command) -> Result<(), LinkError> {
        registry.encode(Direction::ToServer, command, &mut self.outbound)?;
        self.stats.commands_sent += 1;
        Ok(())
    }

    /// Drain the outbound queue to the transport; returns bytes written
    pub async fn flush(&mut self, transport: &mut dyn Transport) -> Result<usize, LinkError> {
        let mut written = 0;
        while !self.outbound.is_empty() {
            let n = transport.write(self.outbound.as_slice()).await?;
            if n == 0 {
                return Err(LinkError::TransportError(
                    "Transport accepted no bytes".to_string(),
                ));
            }
            self.outbound.skip(n);
            written += n;
        }
        if written > 0 {
            debug!("Flushed {} bytes", written);
        }
        self.stats.bytes_sent += written as u64;
        Ok(written)
    }
}

/// Tracks consecutive failed reads from the transport
#[derive(Debug, Clone)]
pub struct FailureCounter {
    consecutive: u32,
    limit: u32,
}

impl Default for FailureCounter {
    fn default() -> Self {
        Self::new(MAX_READ_FAILURES)
    }
}

impl FailureCounter {
    pub fn new(limit: u32) -> Self {
        Self {
            consecutive: 0,
            limit,
        }
    }

    /// Record the outcome of one read. Returns `true` once the limit of
    /// consecutive failures is reached.
    pub fn record(&mut self, bytes_read: Result<usize, &LinkError>) -> bool {
        match bytes_read {
            Ok(n) if n > 0 => {
                self.consecutive = 0;
                false
            }
            Ok(_) => self.fail("no data"),
            Err(e) => self.fail(&e.to_string()),
        }
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    fn fail(&mut self, reason: &str) -> bool {
        self.consecutive += 1;
        warn!(
            "Read failed ({}), {} of {} consecutive",
            reason, self.consecutive, self.limit
        );
        self.consecutive >= self.limit
    }
}
