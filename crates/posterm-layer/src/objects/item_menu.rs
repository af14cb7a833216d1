use super::{FIELD_COLOR, FRAME_LOWERED, FRAME_RAISED, HIGHLIGHT_COLOR, ROW_HEIGHT, TEXT_COLOR};
use crate::backend::{Align, Painter, TextRun};
use crate::input::{keys, KeyEvent, MouseAction};
use crate::object::{LayerObject, ObjectEvent, Response};
use crate::region::Region;

/// Drop-down selector.
///
/// Closed, it shows the chosen item. A press opens a column of rows below
/// it; pressing a row chooses it and closes the menu.
#[derive(Debug, Clone)]
pub struct ItemMenu {
    id: u16,
    region: Region,
    font: u8,
    items: Vec<String>,
    chosen: usize,
    open: bool,
    // Rows that fit below the closed box inside the layer
    max_rows: usize,
}

impl ItemMenu {
    pub fn new<I, S>(id: u16, region: Region, font: u8, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            region,
            font,
            items: items.into_iter().map(Into::into).collect(),
            chosen: 0,
            open: false,
            max_rows: usize::MAX,
        }
    }

    pub fn chosen(&self) -> Option<&str> {
        self.items.get(self.chosen).map(String::as_str)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn visible_rows(&self) -> usize {
        self.items.len().min(self.max_rows)
    }

    fn row_region(&self, row: usize) -> Region {
        let r = self.region;
        Region::new(r.x(), r.bottom() + row as i32 * ROW_HEIGHT, r.w(), ROW_HEIGHT)
    }

    fn label(&self, painter: &mut Painter<'_>, area: Region, text: &str) {
        painter.text(&TextRun {
            x: area.x() + 4,
            y: area.y() + (area.h() - ROW_HEIGHT).max(0) / 2,
            text,
            font: self.font,
            color: TEXT_COLOR,
            align: Align::Left,
            max_width: Some(area.w() - 8),
        });
    }

    fn choose(&mut self, index: usize) -> Response {
        self.open = false;
        if index == self.chosen {
            return Response::Redraw;
        }
        self.chosen = index;
        Response::Event(ObjectEvent::Selected(index.min(u16::MAX as usize) as u16))
    }
}

impl LayerObject for ItemMenu {
    fn id(&self) -> u16 {
        self.id
    }

    /// The closed box, plus the rows below it while open
    fn region(&self) -> Region {
        if self.open {
            let rows = self.visible_rows() as i32;
            let r = self.region;
            Region::new(r.x(), r.y(), r.w(), r.h() + rows * ROW_HEIGHT)
        } else {
            self.region
        }
    }

    fn layout(&mut self, bounds: Region) {
        let below = bounds.bottom() - self.region.bottom();
        self.max_rows = (below / ROW_HEIGHT).max(0) as usize;
    }

    fn render(&self, painter: &mut Painter<'_>) {
        painter.fill_rect(self.region, FIELD_COLOR);
        painter.frame(self.region, 1, FRAME_LOWERED);
        if let Some(text) = self.chosen() {
            self.label(painter, self.region, text);
        }
        if !self.open {
            return;
        }
        for (row, item) in self.items.iter().take(self.visible_rows()).enumerate() {
            let area = self.row_region(row);
            let fill = if row == self.chosen {
                HIGHLIGHT_COLOR
            } else {
                FIELD_COLOR
            };
            painter.fill_rect(area, fill);
            self.label(painter, area, item);
        }
        let rows = Region::new(
            self.region.x(),
            self.region.bottom(),
            self.region.w(),
            self.visible_rows() as i32 * ROW_HEIGHT,
        );
        painter.frame(rows, 1, FRAME_RAISED);
    }

    fn mouse_exit(&mut self) -> Response {
        if self.open {
            self.open = false;
            return Response::Redraw;
        }
        Response::Ignored
    }

    fn mouse_action(&mut self, action: MouseAction, x: i32, y: i32) -> Response {
        if action != MouseAction::Press || self.items.is_empty() {
            return Response::Ignored;
        }
        if !self.open {
            self.open = true;
            return Response::Redraw;
        }
        let hit = (0..self.visible_rows()).find(|&row| self.row_region(row).contains(x, y));
        match hit {
            Some(row) => self.choose(row),
            None => {
                self.open = false;
                Response::Redraw
            }
        }
    }

    fn keyboard(&mut self, key: KeyEvent) -> Response {
        if self.items.is_empty() {
            return Response::Ignored;
        }
        match key.code {
            keys::UP if self.chosen > 0 => self.choose(self.chosen - 1),
            keys::DOWN if self.chosen + 1 < self.items.len() => self.choose(self.chosen + 1),
            keys::ESCAPE if self.open => {
                self.open = false;
                Response::Redraw
            }
            _ => Response::Ignored,
        }
    }
}
