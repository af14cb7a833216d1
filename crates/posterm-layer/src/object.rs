//! Interactive objects attached to a layer

use crate::backend::Painter;
use crate::input::{KeyEvent, MouseAction};
use crate::region::Region;
use std::fmt;

/// Something an object reports to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectEvent {
    Pressed,
    Selected(u16),
    Scrolled(u16),
    Committed(String),
}

/// How an object reacted to an input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Not handled; routing continues as if the object were absent
    Ignored,
    /// Handled, the object needs repainting
    Redraw,
    /// Handled, repaint and report to the server
    Event(ObjectEvent),
}

impl Response {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Response::Ignored)
    }
}

/// Interactive overlay owned by one [`Layer`](crate::Layer).
///
/// Coordinates are relative to the owning layer. Every capability except
/// identity and placement has a no-op default.
pub trait LayerObject: fmt::Debug {
    /// Server-assigned id, reported back in events
    fn id(&self) -> u16;

    /// Area that receives input and is repainted
    fn region(&self) -> Region;

    fn render(&self, _painter: &mut Painter<'_>) {}

    /// Fit the object into `bounds`, the layer's own area
    fn layout(&mut self, _bounds: Region) {}

    fn mouse_enter(&mut self) -> Response {
        Response::Ignored
    }

    fn mouse_exit(&mut self) -> Response {
        Response::Ignored
    }

    fn mouse_action(&mut self, _action: MouseAction, _x: i32, _y: i32) -> Response {
        Response::Ignored
    }

    fn keyboard(&mut self, _key: KeyEvent) -> Response {
        Response::Ignored
    }
}
