//! Command interpreter for posterm
//!
//! Drains decoded server commands from the link and applies each one to the
//! terminal: the layer stack, the current and target layers, the
//! translation table and the runtime settings. Input travels the other way,
//! from the compositor's outcomes to commands queued for the server.

pub mod context;
pub mod interpreter;
pub mod outcome;
pub mod payment;
pub mod settings;

pub use context::{RenderContext, Terminal};
pub use interpreter::{Flow, InputEvent, Interpreter};
pub use outcome::encode_outcome;
pub use payment::{
    OfflineProcessor, PaymentDesk, PaymentProcessor, PaymentResult, PaymentStatus, Transaction,
};
pub use settings::{Settings, Translations};

use posterm_link::LinkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InterpError {
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    #[error("Schema mismatch for {name}: {source}")]
    Payload {
        name: &'static str,
        #[source]
        source: LinkError,
    },
}
