//! posterm: the display terminal of a point-of-sale system
//!
//! Connects to the POS server, executes the drawing and layer commands it
//! streams, and reports touches, clicks and keys back. The screen is a grid
//! of console cells standing in for the pixel display.

pub mod client;
pub mod config;
pub mod input;
pub mod screen;
pub mod session;

pub use config::{Args, LogLevel, TerminalConfig};
pub use input::{Input, InputMapper};
pub use screen::{Headless, Presenter, Screen};
pub use session::{Session, SessionEnd};
