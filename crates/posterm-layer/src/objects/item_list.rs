use super::{HIGHLIGHT_COLOR, ROW_HEIGHT, TEXT_COLOR};
use crate::backend::{Align, Painter, TextRun};
use crate::input::{keys, KeyEvent, MouseAction};
use crate::object::{LayerObject, ObjectEvent, Response};
use crate::region::Region;
use posterm_list::DList;

/// Scrolling list of selectable rows
#[derive(Debug)]
pub struct ItemList {
    id: u16,
    region: Region,
    font: u8,
    items: DList<String>,
    selected: Option<usize>,
    top: usize,
    rows: usize,
}

impl ItemList {
    /// Build a list; with `sorted` the items are ordered alphabetically,
    /// otherwise they keep the order given
    pub fn new<I, S>(id: u16, region: Region, font: u8, sorted: bool, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items: DList<String> = items.into_iter().map(Into::into).collect();
        if sorted {
            items.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
        }
        let mut list = Self {
            id,
            region,
            font,
            items,
            selected: None,
            top: 0,
            rows: 0,
        };
        list.layout(region);
        list
    }

    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn top(&self) -> usize {
        self.top
    }

    fn select(&mut self, index: usize) -> Response {
        let count = self.items.count();
        if index >= count || self.selected == Some(index) {
            return Response::Ignored;
        }
        self.selected = Some(index);
        if index < self.top {
            self.top = index;
        } else if self.rows > 0 && index >= self.top + self.rows {
            self.top = index + 1 - self.rows;
        }
        Response::Event(ObjectEvent::Selected(index.min(u16::MAX as usize) as u16))
    }
}

impl LayerObject for ItemList {
    fn id(&self) -> u16 {
        self.id
    }

    fn region(&self) -> Region {
        self.region
    }

    fn layout(&mut self, bounds: Region) {
        self.region = self.region.intersect(&bounds);
        self.rows = (self.region.h() / ROW_HEIGHT).max(0) as usize;
    }

    fn render(&self, painter: &mut Painter<'_>) {
        let r = self.region;
        for (row, (index, item)) in self
            .items
            .iter()
            .enumerate()
            .skip(self.top)
            .take(self.rows)
            .enumerate()
        {
            let y = r.y() + row as i32 * ROW_HEIGHT;
            if self.selected == Some(index) {
                painter.fill_rect(Region::new(r.x(), y, r.w(), ROW_HEIGHT), HIGHLIGHT_COLOR);
            }
            painter.text(&TextRun {
                x: r.x() + 4,
                y,
                text: item,
                font: self.font,
                color: TEXT_COLOR,
                align: Align::Left,
                max_width: Some(r.w() - 8),
            });
        }
    }

    fn mouse_action(&mut self, action: MouseAction, _x: i32, y: i32) -> Response {
        if action != MouseAction::Press {
            return Response::Ignored;
        }
        let row = (y - self.region.y()) / ROW_HEIGHT;
        if row < 0 {
            return Response::Ignored;
        }
        self.select(self.top + row as usize)
    }

    fn keyboard(&mut self, key: KeyEvent) -> Response {
        let current = self.selected;
        match key.code {
            keys::UP => match current {
                Some(i) if i > 0 => self.select(i - 1),
                _ => Response::Ignored,
            },
            keys::DOWN => self.select(current.map_or(0, |i| i + 1)),
            keys::HOME => self.select(0),
            keys::END => self.select(self.items.count().saturating_sub(1)),
            _ => Response::Ignored,
        }
    }
}
