//! Input events and what routing them produced

/// Pointer button transition or motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Press,
    Release,
    Move,
}

impl MouseAction {
    /// Code sent to the server
    pub fn code(self) -> u8 {
        match self {
            MouseAction::Press => 1,
            MouseAction::Release => 2,
            MouseAction::Move => 3,
        }
    }
}

/// Pointer event in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub action: MouseAction,
    pub x: i32,
    pub y: i32,
}

impl MouseEvent {
    pub fn new(action: MouseAction, x: i32, y: i32) -> Self {
        Self { action, x, y }
    }
}

pub mod keys {
    pub const BACKSPACE: u32 = 8;
    pub const TAB: u32 = 9;
    pub const ENTER: u32 = 13;
    pub const ESCAPE: u32 = 27;
    pub const DELETE: u32 = 127;
    // Non-character keys live above the Unicode range
    pub const LEFT: u32 = 0x11_0000;
    pub const RIGHT: u32 = 0x11_0001;
    pub const UP: u32 = 0x11_0002;
    pub const DOWN: u32 = 0x11_0003;
    pub const HOME: u32 = 0x11_0004;
    pub const END: u32 = 0x11_0005;
    pub const PAGE_UP: u32 = 0x11_0006;
    pub const PAGE_DOWN: u32 = 0x11_0007;
    pub const FUNCTION_BASE: u32 = 0x11_0100;

    pub const MOD_SHIFT: u8 = 0x01;
    pub const MOD_CTRL: u8 = 0x02;
    pub const MOD_ALT: u8 = 0x04;
}

/// Key press: a Unicode scalar value or one of the [`keys`] codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: u32,
    pub modifiers: u8,
}

impl KeyEvent {
    pub fn new(code: u32, modifiers: u8) -> Self {
        Self { code, modifiers }
    }

    pub fn from_char(c: char) -> Self {
        Self::new(u32::from(c), 0)
    }

    /// The printable character this key produces, if any
    pub fn printable(&self) -> Option<char> {
        if self.modifiers & (keys::MOD_CTRL | keys::MOD_ALT) != 0 {
            return None;
        }
        char::from_u32(self.code).filter(|c| !c.is_control())
    }
}

/// Result of routing one input event, for the caller to report to the
/// server. Coordinates are relative to the layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// Touch on a layer where no object was hit
    Touch { layer: u16, x: i32, y: i32 },
    /// Button press or release on a layer where no object was hit
    Mouse {
        layer: u16,
        action: MouseAction,
        x: i32,
        y: i32,
    },
    /// Key not consumed by an object
    Key { code: u32, modifiers: u8 },
    ButtonPress { layer: u16, object: u16 },
    ItemSelect { layer: u16, object: u16, index: u16 },
    Scroll { layer: u16, object: u16, value: u16 },
    TextCommit {
        layer: u16,
        object: u16,
        text: String,
    },
    /// The screensaver was dismissed; the event goes no further
    Unblanked,
}
