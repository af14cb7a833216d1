use super::{FRAME_RAISED, HIGHLIGHT_COLOR, TRACK_COLOR};
use crate::backend::Painter;
use crate::input::{keys, KeyEvent, MouseAction};
use crate::object::{LayerObject, ObjectEvent, Response};
use crate::region::Region;

/// Vertical scrollbar over `total` rows of which `visible` fit on screen
#[derive(Debug, Clone)]
pub struct Scrollbar {
    id: u16,
    region: Region,
    total: u16,
    visible: u16,
    position: u16,
    dragging: bool,
}

impl Scrollbar {
    pub fn new(id: u16, region: Region, total: u16, visible: u16) -> Self {
        Self {
            id,
            region,
            total,
            visible: visible.min(total),
            position: 0,
            dragging: false,
        }
    }

    /// First visible row
    pub fn position(&self) -> u16 {
        self.position
    }

    fn max_position(&self) -> u16 {
        self.total.saturating_sub(self.visible)
    }

    fn thumb(&self) -> Region {
        let r = self.region;
        if self.total == 0 {
            return r;
        }
        let total = i32::from(self.total);
        let h = (r.h() * i32::from(self.visible.max(1)) / total).max(4).min(r.h());
        let span = r.h() - h;
        let max = i32::from(self.max_position()).max(1);
        let y = r.y() + span * i32::from(self.position) / max;
        Region::new(r.x(), y, r.w(), h)
    }

    /// Move so the thumb centre sits at `y` (layer coordinates)
    fn seek(&mut self, y: i32) -> Response {
        let r = self.region;
        let max = self.max_position();
        if max == 0 || r.h() == 0 {
            return Response::Ignored;
        }
        let offset = (y - r.y()).clamp(0, r.h());
        let pos = (i64::from(offset) * i64::from(max) / i64::from(r.h())) as u16;
        self.set_position(pos)
    }

    fn set_position(&mut self, pos: u16) -> Response {
        let pos = pos.min(self.max_position());
        if pos == self.position {
            return Response::Ignored;
        }
        self.position = pos;
        Response::Event(ObjectEvent::Scrolled(pos))
    }
}

impl LayerObject for Scrollbar {
    fn id(&self) -> u16 {
        self.id
    }

    fn region(&self) -> Region {
        self.region
    }

    fn render(&self, painter: &mut Painter<'_>) {
        painter.fill_rect(self.region, TRACK_COLOR);
        let thumb = self.thumb();
        painter.fill_rect(thumb, HIGHLIGHT_COLOR);
        painter.frame(thumb, 1, FRAME_RAISED);
    }

    fn mouse_exit(&mut self) -> Response {
        self.dragging = false;
        Response::Ignored
    }

    fn mouse_action(&mut self, action: MouseAction, _x: i32, y: i32) -> Response {
        match action {
            MouseAction::Press => {
                self.dragging = true;
                self.seek(y)
            }
            MouseAction::Move if self.dragging => self.seek(y),
            MouseAction::Release => {
                self.dragging = false;
                Response::Ignored
            }
            MouseAction::Move => Response::Ignored,
        }
    }

    fn keyboard(&mut self, key: KeyEvent) -> Response {
        match key.code {
            keys::UP => self.set_position(self.position.saturating_sub(1)),
            keys::DOWN => self.set_position(self.position.saturating_add(1)),
            keys::PAGE_UP => self.set_position(self.position.saturating_sub(self.visible)),
            keys::PAGE_DOWN => self.set_position(self.position.saturating_add(self.visible)),
            _ => Response::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_maps_track_to_position() {
        let mut s = Scrollbar::new(1, Region::new(0, 0, 10, 100), 30, 10);
        assert_eq!(
            s.mouse_action(MouseAction::Press, 5, 50),
            Response::Event(ObjectEvent::Scrolled(10))
        );
        assert_eq!(
            s.mouse_action(MouseAction::Move, 5, 100),
            Response::Event(ObjectEvent::Scrolled(20))
        );
        s.mouse_action(MouseAction::Release, 5, 100);
        assert_eq!(s.mouse_action(MouseAction::Move, 5, 0), Response::Ignored);
    }

    #[test]
    fn test_keys_clamp_to_range() {
        let mut s = Scrollbar::new(1, Region::new(0, 0, 10, 100), 12, 10);
        assert_eq!(s.keyboard(KeyEvent::new(keys::UP, 0)), Response::Ignored);
        s.keyboard(KeyEvent::new(keys::PAGE_DOWN, 0));
        assert_eq!(s.position(), 2);
    }

    #[test]
    fn test_nothing_to_scroll() {
        let mut s = Scrollbar::new(1, Region::new(0, 0, 10, 100), 5, 10);
        assert_eq!(s.mouse_action(MouseAction::Press, 5, 80), Response::Ignored);
    }
}
