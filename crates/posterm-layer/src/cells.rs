//! Character-cell drawing backend
//!
//! Rasterizes the drawing primitives onto a grid of text cells so the
//! terminal can run inside an ordinary text console. Each cell stands for a
//! `cell_w` x `cell_h` block of pixels and is painted when its centre pixel
//! is drawn on.

use crate::backend::{Align, DrawBackend, TextRun};
use crate::region::Region;
use crate::LayerError;
use std::path::Path;

/// Textures map onto the 16 base palette colours
pub const TEXTURE_COUNT: u8 = 16;
/// Fonts 0 and 1 are regular, 2 and 3 bold
pub const FONT_COUNT: u8 = 4;

const FRAME_LIGHT: u8 = 15;
const FRAME_DARK: u8 = 8;
const SHADOW_COLOR: u8 = 8;

/// A single cell of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// The character in this cell
    pub c: char,

    /// Foreground palette index
    pub fg: u8,

    /// Background palette index
    pub bg: u8,

    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            c: ' ',
            fg: 15,
            bg: 0,
            bold: false,
        }
    }
}

/// Grid of cells implementing [`DrawBackend`]
#[derive(Debug, Clone)]
pub struct CellBuffer {
    cols: u16,
    rows: u16,
    cell_w: i32,
    cell_h: i32,

    /// Cells in row-major order
    cells: Vec<Cell>,

    /// Active clip in pixels
    clip: Region,

    /// Rows presented since the last [`take_dirty_rows`](Self::take_dirty_rows)
    dirty: Vec<bool>,

    cursor_shape: u8,
    bells: u32,
    iconify_requested: bool,
}

impl CellBuffer {
    /// Create a grid of `cols` x `rows` cells, each `cell_w` x `cell_h`
    /// pixels
    pub fn new(cols: u16, rows: u16, cell_w: i32, cell_h: i32) -> Self {
        let cell_w = cell_w.max(1);
        let cell_h = cell_h.max(1);
        Self {
            cols,
            rows,
            cell_w,
            cell_h,
            cells: vec![Cell::default(); usize::from(cols) * usize::from(rows)],
            clip: Region::new(0, 0, i32::from(cols) * cell_w, i32::from(rows) * cell_h),
            dirty: vec![false; usize::from(rows)],
            cursor_shape: 0,
            bells: 0,
            iconify_requested: false,
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cell_size(&self) -> (i32, i32) {
        (self.cell_w, self.cell_h)
    }

    /// Get cell at a grid position
    pub fn cell_at(&self, col: u16, row: u16) -> Option<&Cell> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells
            .get(usize::from(row) * usize::from(self.cols) + usize::from(col))
    }

    fn cell_at_mut(&mut self, col: u16, row: u16) -> Option<&mut Cell> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        let index = usize::from(row) * usize::from(self.cols) + usize::from(col);
        self.cells.get_mut(index)
    }

    /// Characters of one row
    pub fn row_text(&self, row: u16) -> String {
        (0..self.cols)
            .filter_map(|col| self.cell_at(col, row))
            .map(|cell| cell.c)
            .collect()
    }

    /// Rows presented since the last call, top to bottom
    pub fn take_dirty_rows(&mut self) -> Vec<u16> {
        let rows = self
            .dirty
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d)
            .map(|(row, _)| row as u16)
            .collect();
        self.dirty.fill(false);
        rows
    }

    pub fn cursor_shape(&self) -> u8 {
        self.cursor_shape
    }

    /// Bells rung since creation
    pub fn bells(&self) -> u32 {
        self.bells
    }

    /// Whether iconify was requested since the last call
    pub fn take_iconify(&mut self) -> bool {
        std::mem::take(&mut self.iconify_requested)
    }

    /// Resize the grid, keeping the overlapping content
    pub fn resize(&mut self, new_cols: u16, new_rows: u16) {
        let mut new_cells = vec![Cell::default(); usize::from(new_cols) * usize::from(new_rows)];

        let copy_cols = usize::from(self.cols.min(new_cols));
        let copy_rows = usize::from(self.rows.min(new_rows));
        for y in 0..copy_rows {
            let old_start = y * usize::from(self.cols);
            let new_start = y * usize::from(new_cols);
            new_cells[new_start..new_start + copy_cols]
                .copy_from_slice(&self.cells[old_start..old_start + copy_cols]);
        }

        self.cells = new_cells;
        self.cols = new_cols;
        self.rows = new_rows;
        self.dirty = vec![true; usize::from(new_rows)];
        self.clip = self.screen();
    }

    fn screen(&self) -> Region {
        Region::new(
            0,
            0,
            i32::from(self.cols) * self.cell_w,
            i32::from(self.rows) * self.cell_h,
        )
    }

    /// Grid cells whose centre lies inside `region` and the clip
    fn covered(&self, region: Region) -> Vec<(u16, u16)> {
        let area = region.intersect(&self.clip);
        if area.is_empty() {
            return Vec::new();
        }
        let first_col = area.x().div_euclid(self.cell_w).max(0);
        let last_col = (area.right() - 1)
            .div_euclid(self.cell_w)
            .min(i32::from(self.cols) - 1);
        let first_row = area.y().div_euclid(self.cell_h).max(0);
        let last_row = (area.bottom() - 1)
            .div_euclid(self.cell_h)
            .min(i32::from(self.rows) - 1);

        let mut cells = Vec::new();
        for row in first_row..=last_row {
            for col in first_col..=last_col {
                let cx = col * self.cell_w + self.cell_w / 2;
                let cy = row * self.cell_h + self.cell_h / 2;
                if area.contains(cx, cy) {
                    cells.push((col as u16, row as u16));
                }
            }
        }
        cells
    }

    fn paint<F>(&mut self, region: Region, mut f: F)
    where
        F: FnMut(&mut Cell),
    {
        for (col, row) in self.covered(region) {
            if let Some(cell) = self.cell_at_mut(col, row) {
                f(cell);
            }
        }
    }

    /// Box-drawing border around the cells covered by `region`
    fn border(&mut self, region: Region, top_left: u8, bottom_right: u8) {
        // Border placement ignores the clip; painting honours it
        let saved = self.clip;
        self.clip = self.screen();
        let cells = self.covered(region);
        self.clip = saved;

        let Some(&(min_col, min_row)) = cells.first() else {
            return;
        };
        let Some(&(max_col, max_row)) = cells.last() else {
            return;
        };

        for (col, row) in cells {
            let top = row == min_row;
            let bottom = row == max_row;
            let left = col == min_col;
            let right = col == max_col;
            let (c, color) = match (top, bottom, left, right) {
                (true, _, true, _) => ('┌', top_left),
                (true, _, _, true) => ('┐', top_left),
                (_, true, true, _) => ('└', bottom_right),
                (_, true, _, true) => ('┘', bottom_right),
                (true, _, _, _) => ('─', top_left),
                (_, true, _, _) => ('─', bottom_right),
                (_, _, true, _) => ('│', top_left),
                (_, _, _, true) => ('│', bottom_right),
                _ => continue,
            };
            if !self.clip.contains(
                i32::from(col) * self.cell_w + self.cell_w / 2,
                i32::from(row) * self.cell_h + self.cell_h / 2,
            ) {
                continue;
            }
            if let Some(cell) = self.cell_at_mut(col, row) {
                cell.c = c;
                cell.fg = color;
            }
        }
    }
}

impl DrawBackend for CellBuffer {
    fn size(&self) -> (i32, i32) {
        let s = self.screen();
        (s.w(), s.h())
    }

    fn set_clip(&mut self, clip: Region) {
        self.clip = clip.intersect(&self.screen());
    }

    fn fill_rect(&mut self, region: Region, color: u8) {
        self.paint(region, |cell| {
            cell.c = ' ';
            cell.bg = color;
        });
    }

    fn outline_rect(&mut self, region: Region, color: u8, _thickness: u8) {
        self.border(region, color, color);
    }

    fn draw_text(&mut self, run: &TextRun<'_>) -> Result<(), LayerError> {
        if run.font >= FONT_COUNT {
            return Err(LayerError::UnknownFont(run.font));
        }

        let max_chars = run
            .max_width
            .map_or(usize::MAX, |w| (w.max(0) / self.cell_w) as usize);
        let chars: Vec<char> = run.text.chars().take(max_chars).collect();
        let len = chars.len() as i32;
        let anchor = run.x.div_euclid(self.cell_w);
        let start = match run.align {
            Align::Left => anchor,
            Align::Center => anchor - len / 2,
            Align::Right => anchor - len,
        };
        let row = run.y.div_euclid(self.cell_h);
        if row < 0 || row >= i32::from(self.rows) {
            return Ok(());
        }

        let bold = run.font >= 2;
        for (i, c) in chars.into_iter().enumerate() {
            let col = start + i as i32;
            if col < 0 || col >= i32::from(self.cols) {
                continue;
            }
            let cx = col * self.cell_w + self.cell_w / 2;
            let cy = row * self.cell_h + self.cell_h / 2;
            if !self.clip.contains(cx, cy) {
                continue;
            }
            if let Some(cell) = self.cell_at_mut(col as u16, row as u16) {
                cell.c = c;
                cell.fg = run.color;
                cell.bold = bold;
            }
        }
        Ok(())
    }

    fn draw_frame(&mut self, region: Region, width: u8, style: u8) {
        if width == 0 {
            return;
        }
        // Odd styles are sunken
        if style % 2 == 1 {
            self.border(region, FRAME_DARK, FRAME_LIGHT);
        } else {
            self.border(region, FRAME_LIGHT, FRAME_DARK);
        }
    }

    fn fill_texture(&mut self, region: Region, texture: u8) -> Result<(), LayerError> {
        if texture >= TEXTURE_COUNT {
            return Err(LayerError::UnknownTexture(texture));
        }
        self.fill_rect(region, texture);
        Ok(())
    }

    fn draw_shadow(&mut self, region: Region, _size: u8, _shape: u8) {
        let (cw, ch) = (self.cell_w, self.cell_h);
        let right = Region::new(region.right(), region.y() + ch, cw, region.h());
        let below = Region::new(region.x() + cw, region.bottom(), region.w(), ch);
        self.fill_rect(right, SHADOW_COLOR);
        self.fill_rect(below, SHADOW_COLOR);
    }

    fn draw_image(&mut self, region: Region, name: &str) -> Result<(), LayerError> {
        let path = Path::new(name);
        if !path.is_file() {
            return Err(LayerError::MissingImage(name.to_string()));
        }
        // No pixels in a text console: show which image this is
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        self.fill_rect(region, 0);
        self.draw_text(&TextRun {
            x: region.x() + region.w() / 2,
            y: region.y() + region.h() / 2,
            text: &label,
            font: 0,
            color: 7,
            align: Align::Center,
            max_width: Some(region.w()),
        })
    }

    fn present(&mut self, region: Region) {
        let area = region.intersect(&self.screen());
        if area.is_empty() {
            return;
        }
        let first = area.y().div_euclid(self.cell_h).max(0) as usize;
        let last = ((area.bottom() - 1).div_euclid(self.cell_h) as usize)
            .min(self.dirty.len().saturating_sub(1));
        for row in first..=last {
            self.dirty[row] = true;
        }
    }

    fn set_cursor(&mut self, shape: u8) {
        self.cursor_shape = shape;
    }

    fn bell(&mut self, _volume: u8) {
        self.bells += 1;
    }

    fn iconify(&mut self) {
        self.iconify_requested = true;
    }
}
