//! Card transaction sub-protocol
//!
//! Every card opcode carries the same request layout. The request is read
//! into the one shared [`Transaction`], handed to the processor, answered
//! with a `CcProcessed` command and then cleared for the next request.

use posterm_link::{Command, LinkError, PaymentKind, TerminalOp};
use tracing::{info, warn};

/// The request currently being processed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    pub id: u64,
    pub amount: f64,
    pub tip: f64,
    pub card: String,
    pub expiry: String,
    pub holder: String,
    pub reference: String,
}

/// How a request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PaymentStatus {
    Approved = 1,
    Declined = 2,
    Error = 3,
}

/// Processor answer for one request
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentResult {
    pub status: PaymentStatus,
    pub approval: String,
    pub auth_code: String,
    pub message: String,
    /// Amount actually authorised
    pub amount: f64,
}

impl PaymentResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: PaymentStatus::Error,
            approval: String::new(),
            auth_code: String::new(),
            message: message.into(),
            amount: 0.0,
        }
    }
}

/// The card processing collaborator.
///
/// Called synchronously from the event loop; the terminal does nothing else
/// until it returns.
pub trait PaymentProcessor: Send {
    fn process(&mut self, kind: PaymentKind, transaction: &Transaction) -> PaymentResult;
}

/// Processor for terminals without a card reader: every request fails
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineProcessor;

impl PaymentProcessor for OfflineProcessor {
    fn process(&mut self, kind: PaymentKind, _transaction: &Transaction) -> PaymentResult {
        warn!("No card processor for {:?} request", kind);
        PaymentResult::error("Card processing unavailable")
    }
}

/// Shared transaction plus the processor that settles it
pub struct PaymentDesk {
    transaction: Transaction,
    processor: Box<dyn PaymentProcessor>,
}

impl std::fmt::Debug for PaymentDesk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentDesk")
            .field("transaction", &self.transaction)
            .finish_non_exhaustive()
    }
}

impl PaymentDesk {
    pub fn new(processor: Box<dyn PaymentProcessor>) -> Self {
        Self {
            transaction: Transaction::default(),
            processor,
        }
    }

    /// The shared transaction; empty between requests
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// Run one card request and build the reply for the server
    pub fn handle(&mut self, kind: PaymentKind, request: &mut Command) -> Result<Command, LinkError> {
        self.transaction = Transaction {
            id: request.take_u64()?,
            amount: request.take_fixed()?,
            tip: request.take_fixed()?,
            card: request.take_str()?,
            expiry: request.take_str()?,
            holder: request.take_str()?,
            reference: request.take_str()?,
        };

        let result = self.processor.process(kind, &self.transaction);
        info!(
            "Card {:?} for transaction {}: {:?}",
            kind, self.transaction.id, result.status
        );

        let reply = Command::build(TerminalOp::CcProcessed)
            .u64(self.transaction.id)
            .u8(kind.code())
            .u8(result.status as u8)
            .str(result.approval)
            .str(result.auth_code)
            .str(result.message)
            .fixed(result.amount)
            .finish();

        self.transaction = Transaction::default();
        Ok(reply)
    }
}
