//! Layer compositor for posterm
//!
//! Owns the stack of layers that make up the screen, turns damaged areas
//! into the smallest set of layers to repaint, and routes pointer and
//! keyboard input to the layer and object under it.

pub mod backend;
pub mod cells;
pub mod input;
pub mod layer;
pub mod object;
pub mod objects;
pub mod region;
pub mod screensaver;
pub mod stack;

pub use backend::{Align, DrawBackend, Painter, TextRun};
pub use cells::{Cell, CellBuffer};
pub use input::{keys, InputOutcome, KeyEvent, MouseAction, MouseEvent};
pub use layer::{DrawOp, Layer, LayerKey, FLAG_TITLE_BAR, TITLE_HEIGHT};
pub use object::{LayerObject, ObjectEvent, Response};
pub use objects::{ItemList, ItemMenu, PushButton, Scrollbar, TextEntry};
pub use region::Region;
pub use screensaver::Screensaver;
pub use stack::{LayerStack, Placement};

use thiserror::Error;

/// Resource failures reported by a [`DrawBackend`]. The compositor answers
/// each with a fallback rather than failing the draw.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    #[error("Unknown texture {0}")]
    UnknownTexture(u8),

    #[error("Unknown font {0}")]
    UnknownFont(u8),

    #[error("Image not available: {0}")]
    MissingImage(String),
}
