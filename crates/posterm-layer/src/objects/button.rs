use super::{FRAME_LOWERED, FRAME_RAISED, ROW_HEIGHT, TEXT_COLOR};
use crate::backend::{Align, Painter, TextRun};
use crate::input::MouseAction;
use crate::object::{LayerObject, ObjectEvent, Response};
use crate::region::Region;

/// Labelled button; reports a press as soon as it is pushed
#[derive(Debug, Clone)]
pub struct PushButton {
    id: u16,
    region: Region,
    font: u8,
    texture: u8,
    label: String,
    pressed: bool,
}

impl PushButton {
    pub fn new(id: u16, region: Region, font: u8, texture: u8, label: impl Into<String>) -> Self {
        Self {
            id,
            region,
            font,
            texture,
            label: label.into(),
            pressed: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

impl LayerObject for PushButton {
    fn id(&self) -> u16 {
        self.id
    }

    fn region(&self) -> Region {
        self.region
    }

    fn render(&self, painter: &mut Painter<'_>) {
        let style = if self.pressed {
            FRAME_LOWERED
        } else {
            FRAME_RAISED
        };
        painter.texture(self.region, self.texture);
        painter.frame(self.region, 2, style);
        painter.text(&TextRun {
            x: self.region.x() + self.region.w() / 2,
            y: self.region.y() + (self.region.h() - ROW_HEIGHT).max(0) / 2,
            text: &self.label,
            font: self.font,
            color: TEXT_COLOR,
            align: Align::Center,
            max_width: Some(self.region.w()),
        });
    }

    fn mouse_exit(&mut self) -> Response {
        if self.pressed {
            self.pressed = false;
            return Response::Redraw;
        }
        Response::Ignored
    }

    fn mouse_action(&mut self, action: MouseAction, _x: i32, _y: i32) -> Response {
        match action {
            MouseAction::Press => {
                self.pressed = true;
                Response::Event(ObjectEvent::Pressed)
            }
            MouseAction::Release if self.pressed => {
                self.pressed = false;
                Response::Redraw
            }
            _ => Response::Ignored,
        }
    }
}
