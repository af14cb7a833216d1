//! Layers: independently drawn rectangular surfaces
//!
//! A layer keeps what the server drew into it as a display list and replays
//! it whenever the compositor needs the pixels again.

use crate::backend::{Align, Painter, TextRun};
use crate::object::LayerObject;
use crate::region::Region;
use posterm_list::{DList, NodeId, SList};
use std::sync::atomic::{AtomicU64, Ordering};

/// Height of the title bar of a draggable layer
pub const TITLE_HEIGHT: i32 = 24;
/// `flags` bit giving a layer a title bar
pub const FLAG_TITLE_BAR: u8 = 0x01;

const TITLE_COLOR: u8 = 1;
const TITLE_TEXT_COLOR: u8 = 15;

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Identity of one layer instance, unique for the life of the process.
///
/// The server's ids may repeat; keys never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerKey(u64);

impl LayerKey {
    fn next() -> Self {
        LayerKey(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// One recorded drawing command, in layer coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: i32,
        y: i32,
        font: u8,
        color: u8,
        align: Align,
        max_width: Option<i32>,
        text: String,
    },
    Rectangle {
        region: Region,
        color: u8,
        thickness: u8,
    },
    SolidRectangle {
        region: Region,
        color: u8,
    },
    HLine {
        x: i32,
        y: i32,
        len: i32,
        thickness: u8,
        color: u8,
    },
    VLine {
        x: i32,
        y: i32,
        len: i32,
        thickness: u8,
        color: u8,
    },
    Frame {
        region: Region,
        width: u8,
        style: u8,
    },
    FilledFrame {
        region: Region,
        width: u8,
        style: u8,
        texture: u8,
    },
    Shadow {
        region: Region,
        size: u8,
        shape: u8,
    },
    StatusBar {
        region: Region,
        bar_color: u8,
        font: u8,
        text_color: u8,
        text: String,
    },
    EditCursor {
        region: Region,
    },
    Zone {
        region: Region,
        frame: u8,
        texture: u8,
        shape: u8,
    },
    /// Clip change for the ops that follow
    Clip(Option<Region>),
}

const EDIT_CURSOR_COLOR: u8 = 0;

impl DrawOp {
    fn replay(&self, painter: &mut Painter<'_>) {
        match self {
            DrawOp::Text {
                x,
                y,
                font,
                color,
                align,
                max_width,
                text,
            } => painter.text(&TextRun {
                x: *x,
                y: *y,
                text,
                font: *font,
                color: *color,
                align: *align,
                max_width: *max_width,
            }),
            DrawOp::Rectangle {
                region,
                color,
                thickness,
            } => painter.outline_rect(*region, *color, *thickness),
            DrawOp::SolidRectangle { region, color } => painter.fill_rect(*region, *color),
            DrawOp::HLine {
                x,
                y,
                len,
                thickness,
                color,
            } => painter.hline(*x, *y, *len, *thickness, *color),
            DrawOp::VLine {
                x,
                y,
                len,
                thickness,
                color,
            } => painter.vline(*x, *y, *len, *thickness, *color),
            DrawOp::Frame {
                region,
                width,
                style,
            } => painter.frame(*region, *width, *style),
            DrawOp::FilledFrame {
                region,
                width,
                style,
                texture,
            } => {
                painter.texture(*region, *texture);
                painter.frame(*region, *width, *style);
            }
            DrawOp::Shadow {
                region,
                size,
                shape,
            } => painter.shadow(*region, *size, *shape),
            DrawOp::StatusBar {
                region,
                bar_color,
                font,
                text_color,
                text,
            } => {
                painter.fill_rect(*region, *bar_color);
                painter.text(&TextRun {
                    x: region.x() + region.w() / 2,
                    y: region.y(),
                    text,
                    font: *font,
                    color: *text_color,
                    align: Align::Center,
                    max_width: Some(region.w()),
                });
            }
            DrawOp::EditCursor { region } => {
                painter.outline_rect(*region, EDIT_CURSOR_COLOR, 2);
            }
            DrawOp::Zone {
                region,
                frame,
                texture,
                shape,
            } => {
                painter.shadow(*region, 4, *shape);
                painter.texture(*region, *texture);
                painter.frame(*region, 2, *frame);
            }
            DrawOp::Clip(clip) => painter.set_clip(*clip),
        }
    }
}

/// A rectangular page or window
#[derive(Debug)]
pub struct Layer {
    id: u16,
    key: LayerKey,
    region: Region,
    clip: Option<Region>,
    update: bool,
    background: u8,
    ops: SList<DrawOp>,
    title: Option<String>,
    objects: DList<Box<dyn LayerObject>>,
}

impl Layer {
    /// New layer at `region`. `flags` with [`FLAG_TITLE_BAR`] set gives it a
    /// title bar showing `title`, which makes it draggable.
    pub fn new(id: u16, region: Region, flags: u8, title: impl Into<String>) -> Self {
        let title = (flags & FLAG_TITLE_BAR != 0).then(|| title.into());
        Self {
            id,
            key: LayerKey::next(),
            region,
            clip: None,
            update: true,
            background: 0,
            ops: SList::new(),
            title,
            objects: DList::new(),
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn key(&self) -> LayerKey {
        self.key
    }

    /// Screen area
    pub fn region(&self) -> Region {
        self.region
    }

    pub fn move_to(&mut self, x: i32, y: i32) {
        self.region.move_to(x, y);
    }

    /// Current clip, relative to the layer
    pub fn clip(&self) -> Option<Region> {
        self.clip
    }

    /// Clip the drawing recorded from now on; `None` lifts it
    pub fn set_clip(&mut self, clip: Option<Region>) {
        self.clip = clip;
        self.ops.add_to_tail(DrawOp::Clip(clip));
    }

    pub fn needs_update(&self) -> bool {
        self.update
    }

    pub fn request_update(&mut self) {
        self.update = true;
    }

    pub fn clear_update(&mut self) {
        self.update = false;
    }

    pub fn background(&self) -> u8 {
        self.background
    }

    pub fn set_background(&mut self, texture: u8) {
        self.background = texture;
        self.update = true;
    }

    /// Append a drawing command to the display list
    pub fn record(&mut self, op: DrawOp) {
        self.ops.add_to_tail(op);
        self.update = true;
    }

    /// Start a fresh page: forget everything drawn and every object, and
    /// fill with `texture`
    pub fn blank(&mut self, texture: u8) {
        self.ops.purge();
        self.objects.purge();
        self.clip = None;
        self.set_background(texture);
    }

    pub fn ops(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn is_draggable(&self) -> bool {
        self.title.is_some()
    }

    /// Title bar in screen coordinates
    pub fn title_bar(&self) -> Option<Region> {
        self.title.as_ref().map(|_| {
            Region::new(
                self.region.x(),
                self.region.y(),
                self.region.w(),
                TITLE_HEIGHT.min(self.region.h()),
            )
        })
    }

    /// Layer-relative area of the layer itself
    pub fn bounds(&self) -> Region {
        Region::new(0, 0, self.region.w(), self.region.h())
    }

    /// Attach an object, frontmost among this layer's objects
    pub fn add_object(&mut self, mut object: Box<dyn LayerObject>) -> NodeId {
        object.layout(self.bounds());
        self.update = true;
        self.objects.add_to_tail(object)
    }

    pub fn object_count(&self) -> usize {
        self.objects.count()
    }

    /// Frontmost object containing the screen point `(x, y)`
    pub fn find_object(&self, x: i32, y: i32) -> Option<u16> {
        let (lx, ly) = self.to_local(x, y);
        let node = self.objects.rfind(|obj| obj.region().contains(lx, ly))?;
        self.objects.get(node).map(|obj| obj.id())
    }

    /// Frontmost object with server id `id`
    pub fn object_mut(&mut self, id: u16) -> Option<&mut (dyn LayerObject + 'static)> {
        let node = self.objects.rfind(|obj| obj.id() == id)?;
        self.objects.get_mut(node).map(|obj| obj.as_mut())
    }

    pub fn object(&self, id: u16) -> Option<&dyn LayerObject> {
        let node = self.objects.rfind(|obj| obj.id() == id)?;
        self.objects.get(node).map(|obj| obj.as_ref())
    }

    /// Screen area of the object with id `id`
    pub fn object_screen_region(&self, id: u16) -> Option<Region> {
        self.object(id)
            .map(|obj| obj.region().translate(self.region.x(), self.region.y()))
    }

    /// Screen point in layer coordinates
    pub fn to_local(&self, x: i32, y: i32) -> (i32, i32) {
        (x - self.region.x(), y - self.region.y())
    }

    /// Replay the layer through a painter whose origin is the layer's
    /// top-left corner
    pub fn render(&self, painter: &mut Painter<'_>) {
        let bounds = self.bounds();
        painter.set_clip(None);
        painter.texture(bounds, self.background);

        for op in self.ops.iter() {
            op.replay(painter);
        }
        painter.set_clip(None);

        for object in self.objects.iter() {
            object.render(painter);
        }

        if let Some(title) = &self.title {
            let bar = Region::new(0, 0, bounds.w(), TITLE_HEIGHT.min(bounds.h()));
            painter.fill_rect(bar, TITLE_COLOR);
            painter.text(&TextRun {
                x: bar.w() / 2,
                y: 0,
                text: title,
                font: 0,
                color: TITLE_TEXT_COLOR,
                align: Align::Center,
                max_width: Some(bar.w()),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::PushButton;

    #[test]
    fn test_keys_are_unique() {
        let a = Layer::new(5, Region::new(0, 0, 10, 10), 0, "");
        let b = Layer::new(5, Region::new(0, 0, 10, 10), 0, "");
        assert_eq!(a.id(), b.id());
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_title_bar_only_with_flag() {
        let plain = Layer::new(1, Region::new(10, 10, 100, 100), 0, "Ignored");
        assert!(plain.title_bar().is_none());
        assert!(!plain.is_draggable());

        let titled = Layer::new(1, Region::new(10, 10, 100, 100), FLAG_TITLE_BAR, "Orders");
        assert_eq!(titled.title(), Some("Orders"));
        assert_eq!(titled.title_bar(), Some(Region::new(10, 10, 100, TITLE_HEIGHT)));
    }

    #[test]
    fn test_find_object_prefers_latest() {
        let mut layer = Layer::new(1, Region::new(100, 100, 200, 200), 0, "");
        layer.add_object(Box::new(PushButton::new(1, Region::new(0, 0, 50, 50), 0, 0, "a")));
        layer.add_object(Box::new(PushButton::new(2, Region::new(25, 25, 50, 50), 0, 0, "b")));

        assert_eq!(layer.find_object(110, 110), Some(1));
        assert_eq!(layer.find_object(130, 130), Some(2));
        assert_eq!(layer.find_object(190, 190), None);
        assert_eq!(layer.object_screen_region(2), Some(Region::new(125, 125, 50, 50)));
    }

    #[test]
    fn test_blank_forgets_page() {
        let mut layer = Layer::new(1, Region::new(0, 0, 200, 200), 0, "");
        layer.record(DrawOp::SolidRectangle {
            region: Region::new(0, 0, 5, 5),
            color: 1,
        });
        layer.set_clip(Some(Region::new(0, 0, 10, 10)));
        layer.add_object(Box::new(PushButton::new(1, Region::new(0, 0, 50, 50), 0, 0, "a")));
        layer.clear_update();

        layer.blank(3);
        assert_eq!(layer.ops().count(), 0);
        assert_eq!(layer.object_count(), 0);
        assert_eq!(layer.clip(), None);
        assert_eq!(layer.background(), 3);
        assert!(layer.needs_update());
    }
}
