use super::{FIELD_COLOR, FRAME_LOWERED, TEXT_COLOR};
use crate::backend::{Align, Painter, TextRun};
use crate::input::{keys, KeyEvent, MouseAction};
use crate::object::{LayerObject, ObjectEvent, Response};
use crate::region::Region;

const CURSOR_COLOR: u8 = 0;

/// Single-line text field. Enter commits the text to the server.
#[derive(Debug, Clone)]
pub struct TextEntry {
    id: u16,
    region: Region,
    font: u8,
    max_len: usize,
    text: String,
    focused: bool,
}

impl TextEntry {
    pub fn new(id: u16, region: Region, font: u8, max_len: u16, text: impl Into<String>) -> Self {
        let max_len = usize::from(max_len);
        let mut text: String = text.into();
        if let Some((cut, _)) = text.char_indices().nth(max_len) {
            text.truncate(cut);
        }
        Self {
            id,
            region,
            font,
            max_len,
            text,
            focused: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }
}

impl LayerObject for TextEntry {
    fn id(&self) -> u16 {
        self.id
    }

    fn region(&self) -> Region {
        self.region
    }

    fn render(&self, painter: &mut Painter<'_>) {
        let r = self.region;
        painter.fill_rect(r, FIELD_COLOR);
        painter.frame(r, 1, FRAME_LOWERED);
        painter.text(&TextRun {
            x: r.x() + 4,
            y: r.y() + 2,
            text: &self.text,
            font: self.font,
            color: TEXT_COLOR,
            align: Align::Left,
            max_width: Some(r.w() - 8),
        });
        if self.focused {
            painter.vline(r.right() - 4, r.y() + 2, r.h() - 4, 1, CURSOR_COLOR);
        }
    }

    fn mouse_action(&mut self, action: MouseAction, _x: i32, _y: i32) -> Response {
        if action == MouseAction::Press && !self.focused {
            self.focused = true;
            return Response::Redraw;
        }
        Response::Ignored
    }

    fn keyboard(&mut self, key: KeyEvent) -> Response {
        match key.code {
            keys::ENTER => Response::Event(ObjectEvent::Committed(self.text.clone())),
            keys::BACKSPACE | keys::DELETE => match self.text.pop() {
                Some(_) => Response::Redraw,
                None => Response::Ignored,
            },
            keys::ESCAPE if !self.text.is_empty() => {
                self.text.clear();
                Response::Redraw
            }
            _ => match key.printable() {
                Some(c) if self.text.chars().count() < self.max_len => {
                    self.text.push(c);
                    Response::Redraw
                }
                _ => Response::Ignored,
            },
        }
    }
}
