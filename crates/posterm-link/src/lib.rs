//! Wire layer for posterm
//!
//! Byte queues with typed encode/decode primitives, the opcode schema
//! registry that both ends of the connection agree on, and the async
//! transport the terminal reads commands from and flushes replies to.

pub mod protocol;
pub mod queue;
pub mod schema;
pub mod transport;

pub use protocol::{PaymentKind, ServerOp, TerminalOp, PROTOCOL_VERSION};
pub use queue::{ByteQueue, MAX_STRING_LEN};
pub use schema::{Command, CommandBuilder, Direction, FieldKind, Next, Registry, Schema, Value};
pub use transport::{
    connect, FailureCounter, Link, LinkStats, StreamTransport, Transport, MAX_READ_FAILURES,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Truncated value: needed {needed} bytes, {available} buffered")]
    Truncated { needed: usize, available: usize },

    #[error("Field {index} of opcode {opcode}: expected {expected:?}, found {found:?}")]
    FieldMismatch {
        opcode: u8,
        index: usize,
        expected: FieldKind,
        found: Option<FieldKind>,
    },

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Unknown opcode {0}")]
    UnknownOpcode(u8),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
