//! Protocol tables for posterm
//!
//! Opcode numbers and field layouts for both directions. Every coordinate
//! and size is an unsigned 16-bit pixel value; colours, fonts, textures and
//! frame styles are 8-bit palette indices.

use crate::schema::{Direction, FieldKind, Registry};
use crate::LinkError;

/// Protocol version reported in the terminal's hello
pub const PROTOCOL_VERSION: u16 = 1;

macro_rules! opcodes {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $code:literal => $label:literal [$($field:ident),*],
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant = $code,
            )*
        }

        impl $name {
            /// Every opcode in this direction
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            /// Stable name used in logs and schema errors
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)*
                }
            }

            /// Ordered field layout
            pub fn fields(self) -> &'static [FieldKind] {
                match self {
                    $($name::$variant => &[$(FieldKind::$field),*],)*
                }
            }
        }

        impl TryFrom<u8> for $name {
            type Error = u8;

            fn try_from(value: u8) -> Result<Self, u8> {
                match value {
                    $($code => Ok($name::$variant),)*
                    other => Err(other),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(op: $name) -> u8 {
                op as u8
            }
        }
    };
}

opcodes! {
    /// Commands sent from the server to the terminal
    pub enum ServerOp {
        // Layer lifecycle: id, then geometry
        /// id, x, y, w, h, flags, title
        NewLayer = 1 => "new-layer" [U16, U16, U16, U16, U16, U8, Str],
        ShowLayer = 2 => "show-layer" [U16],
        KillLayer = 3 => "kill-layer" [U16],
        TargetLayer = 4 => "target-layer" [U16],
        CurrentLayer = 5 => "current-layer" [U16],

        // Drawing into the current layer
        /// x, y, font, colour, max width (0 = none), text
        TextLeft = 10 => "text-left" [U16, U16, U8, U8, U16, Str],
        TextCenter = 11 => "text-center" [U16, U16, U8, U8, U16, Str],
        TextRight = 12 => "text-right" [U16, U16, U8, U8, U16, Str],
        /// x, y, w, h, colour, thickness
        Rectangle = 13 => "rectangle" [U16, U16, U16, U16, U8, U8],
        /// x, y, w, h, colour
        SolidRectangle = 14 => "solid-rectangle" [U16, U16, U16, U16, U8],
        /// x, y, length, thickness, colour
        HLine = 15 => "hline" [U16, U16, U16, U8, U8],
        VLine = 16 => "vline" [U16, U16, U16, U8, U8],
        /// x, y, w, h, frame width, frame style
        Frame = 17 => "frame" [U16, U16, U16, U16, U8, U8],
        /// x, y, w, h, frame width, frame style, texture
        FilledFrame = 18 => "filled-frame" [U16, U16, U16, U16, U8, U8, U8],
        /// x, y, w, h, shadow size, shape
        Shadow = 19 => "shadow" [U16, U16, U16, U16, U8, U8],
        /// x, y, w, h, bar colour, font, text colour, text
        StatusBar = 20 => "status-bar" [U16, U16, U16, U16, U8, U8, U8, Str],
        EditCursor = 21 => "edit-cursor" [U16, U16, U16, U16],
        /// x, y, w, h, frame style, texture, shape
        Zone = 22 => "zone" [U16, U16, U16, U16, U8, U8, U8],

        // Whole page
        BlankPage = 30 => "blank-page" [U8],
        Background = 31 => "background" [U8],
        SetClip = 32 => "set-clip" [U16, U16, U16, U16],
        ClearClip = 33 => "clear-clip" [],
        UpdateAll = 34 => "update-all" [U8],
        UpdateArea = 35 => "update-area" [U16, U16, U16, U16],
        SelectUpdate = 36 => "select-update" [U16, U16, U16, U16],
        SelectOff = 37 => "select-off" [],

        // Layer objects, attached to the target layer
        /// id, x, y, w, h, font, texture, label
        PushButton = 40 => "push-button" [U16, U16, U16, U16, U16, U8, U8, Str],
        /// id, x, y, w, h, total, visible
        Scrollbar = 41 => "scrollbar" [U16, U16, U16, U16, U16, U16, U16],
        /// id, x, y, w, h, font, sorted, items
        ItemList = 42 => "item-list" [U16, U16, U16, U16, U16, U8, U8, StrList],
        /// id, x, y, w, h, font, items
        ItemMenu = 43 => "item-menu" [U16, U16, U16, U16, U16, U8, StrList],
        /// id, x, y, w, h, font, max length, initial text
        TextEntry = 44 => "text-entry" [U16, U16, U16, U16, U16, U8, U16, Str],

        // Control
        Translations = 50 => "translations" [StrPairs],
        SetMessage = 51 => "set-message" [Str],
        ClearMessage = 52 => "clear-message" [],
        /// seconds, 0 disables
        BlankTime = 53 => "blank-time" [U16],
        /// seconds, 0 disables
        ConnTimeout = 54 => "conn-timeout" [U16],
        SetCursor = 55 => "set-cursor" [U8],
        Bell = 56 => "bell" [U8],
        Iconify = 57 => "iconify" [],
        Shutdown = 58 => "shutdown" [],
        Calibrate = 59 => "calibrate" [],
        BlankScreen = 60 => "blank-screen" [],
        ScreensaverImages = 61 => "screensaver-images" [StrList],

        // Card transactions: txn id, amount, tip, card, expiry, holder, reference
        CcAuth = 70 => "cc-auth" [U64, Fixed, Fixed, Str, Str, Str, Str],
        CcPreAuth = 71 => "cc-pre-auth" [U64, Fixed, Fixed, Str, Str, Str, Str],
        CcFinalAuth = 72 => "cc-final-auth" [U64, Fixed, Fixed, Str, Str, Str, Str],
        CcVoid = 73 => "cc-void" [U64, Fixed, Fixed, Str, Str, Str, Str],
        CcVoidCancel = 74 => "cc-void-cancel" [U64, Fixed, Fixed, Str, Str, Str, Str],
        CcRefund = 75 => "cc-refund" [U64, Fixed, Fixed, Str, Str, Str, Str],
        CcRefundCancel = 76 => "cc-refund-cancel" [U64, Fixed, Fixed, Str, Str, Str, Str],
        CcSettle = 77 => "cc-settle" [U64, Fixed, Fixed, Str, Str, Str, Str],
        CcInit = 78 => "cc-init" [U64, Fixed, Fixed, Str, Str, Str, Str],
        CcTotals = 79 => "cc-totals" [U64, Fixed, Fixed, Str, Str, Str, Str],
        CcDetails = 80 => "cc-details" [U64, Fixed, Fixed, Str, Str, Str, Str],
        CcClearSaf = 81 => "cc-clear-saf" [U64, Fixed, Fixed, Str, Str, Str, Str],
        CcSafDetails = 82 => "cc-saf-details" [U64, Fixed, Fixed, Str, Str, Str, Str],
    }
}

opcodes! {
    /// Commands sent from the terminal to the server
    pub enum TerminalOp {
        /// name, protocol version, width, height
        TermInfo = 1 => "term-info" [Str, U16, U16, U16],
        /// layer, x, y
        Touch = 2 => "touch" [U16, U16, U16],
        /// key code, modifier bits
        Key = 3 => "key" [U32, U8],
        /// layer, action, x, y
        Mouse = 4 => "mouse" [U16, U8, U16, U16],
        /// layer, object
        ButtonPress = 5 => "button-press" [U16, U16],
        /// layer, object, index
        ItemSelect = 6 => "item-select" [U16, U16, U16],
        /// layer, object, position
        Scroll = 7 => "scroll" [U16, U16, U16],
        /// layer, object, text
        TextCommit = 8 => "text-commit" [U16, U16, Str],
        /// txn id, kind, status, approval, auth code, message, amount
        CcProcessed = 9 => "cc-processed" [U64, U8, U8, Str, Str, Str, Fixed],
        /// x, y of the calibration touch
        Calibrated = 10 => "calibrated" [U16, U16],
    }
}

/// Card transaction request kinds, one per `Cc*` server opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentKind {
    Auth,
    PreAuth,
    FinalAuth,
    Void,
    VoidCancel,
    Refund,
    RefundCancel,
    Settle,
    Init,
    Totals,
    Details,
    ClearSaf,
    SafDetails,
}

impl PaymentKind {
    /// The request kind carried by `op`, if it is a card opcode
    pub fn from_op(op: ServerOp) -> Option<Self> {
        Some(match op {
            ServerOp::CcAuth => PaymentKind::Auth,
            ServerOp::CcPreAuth => PaymentKind::PreAuth,
            ServerOp::CcFinalAuth => PaymentKind::FinalAuth,
            ServerOp::CcVoid => PaymentKind::Void,
            ServerOp::CcVoidCancel => PaymentKind::VoidCancel,
            ServerOp::CcRefund => PaymentKind::Refund,
            ServerOp::CcRefundCancel => PaymentKind::RefundCancel,
            ServerOp::CcSettle => PaymentKind::Settle,
            ServerOp::CcInit => PaymentKind::Init,
            ServerOp::CcTotals => PaymentKind::Totals,
            ServerOp::CcDetails => PaymentKind::Details,
            ServerOp::CcClearSaf => PaymentKind::ClearSaf,
            ServerOp::CcSafDetails => PaymentKind::SafDetails,
            _ => return None,
        })
    }

    /// Wire code echoed back in `CcProcessed`
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl Registry {
    /// Registry holding every schema in [`ServerOp`] and [`TerminalOp`]
    pub fn standard() -> Result<Self, LinkError> {
        let mut registry = Registry::new();
        for &op in ServerOp::ALL {
            registry.register(Direction::ToTerminal, op.into(), op.name(), op.fields())?;
        }
        for &op in TerminalOp::ALL {
            registry.register(Direction::ToServer, op.into(), op.name(), op.fields())?;
        }
        Ok(registry)
    }
}
