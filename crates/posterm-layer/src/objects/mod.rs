//! Concrete layer objects

mod button;
mod item_list;
mod item_menu;
mod scrollbar;
mod text_entry;

pub use button::PushButton;
pub use item_list::ItemList;
pub use item_menu::ItemMenu;
pub use scrollbar::Scrollbar;
pub use text_entry::TextEntry;

/// Height of one text row in list-like objects
pub const ROW_HEIGHT: i32 = 24;

pub(crate) const TEXT_COLOR: u8 = 0;
pub(crate) const HIGHLIGHT_COLOR: u8 = 4;
pub(crate) const FIELD_COLOR: u8 = 15;
pub(crate) const TRACK_COLOR: u8 = 8;
pub(crate) const FRAME_RAISED: u8 = 0;
pub(crate) const FRAME_LOWERED: u8 = 1;
