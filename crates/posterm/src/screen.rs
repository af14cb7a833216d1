//! Presenting the cell grid on the console

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{self, Attribute, Color},
    terminal::{self, ClearType},
};
use posterm_layer::CellBuffer;
use std::io::{self, Write};
use tracing::debug;

/// Something that shows the cell grid to a person
pub trait Presenter {
    /// Show the rows drawn since the last call
    fn present(&mut self, cells: &mut CellBuffer) -> Result<()>;
}

/// Discards output; used for `--headless` runs and tests
#[derive(Debug, Default)]
pub struct Headless {
    presented_rows: usize,
}

impl Headless {
    /// Rows that would have been written so far
    pub fn presented_rows(&self) -> usize {
        self.presented_rows
    }
}

impl Presenter for Headless {
    fn present(&mut self, cells: &mut CellBuffer) -> Result<()> {
        self.presented_rows += cells.take_dirty_rows().len();
        cells.take_iconify();
        Ok(())
    }
}

/// Owns the console while the session runs. Raw mode, the alternate screen
/// and mouse capture are released on drop.
pub struct Screen {
    stdout: io::Stdout,
    raw_mode_enabled: bool,
    bells: u32,
}

impl Screen {
    pub fn acquire() -> Result<Self> {
        let mut screen = Self {
            stdout: io::stdout(),
            raw_mode_enabled: false,
            bells: 0,
        };
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        screen.raw_mode_enabled = true;
        execute!(
            screen.stdout,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            terminal::Clear(ClearType::All)
        )?;
        Ok(screen)
    }

    /// Console size in cells
    pub fn size() -> Result<(u16, u16)> {
        terminal::size().context("Failed to query terminal size")
    }

    fn restore(&mut self) -> Result<()> {
        if self.raw_mode_enabled {
            execute!(
                self.stdout,
                style::ResetColor,
                cursor::Show,
                DisableMouseCapture,
                terminal::LeaveAlternateScreen
            )?;
            terminal::disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        Ok(())
    }
}

impl Presenter for Screen {
    fn present(&mut self, cells: &mut CellBuffer) -> Result<()> {
        for row in cells.take_dirty_rows() {
            queue!(self.stdout, cursor::MoveTo(0, row))?;
            for col in 0..cells.cols() {
                let Some(cell) = cells.cell_at(col, row) else {
                    continue;
                };
                queue!(
                    self.stdout,
                    style::SetForegroundColor(palette(cell.fg)),
                    style::SetBackgroundColor(palette(cell.bg))
                )?;
                if cell.bold {
                    queue!(self.stdout, style::SetAttribute(Attribute::Bold))?;
                }
                queue!(self.stdout, style::Print(cell.c))?;
                if cell.bold {
                    queue!(self.stdout, style::SetAttribute(Attribute::Reset))?;
                }
            }
        }

        if cells.bells() != self.bells {
            self.bells = cells.bells();
            write!(self.stdout, "\x07")?;
        }
        if cells.take_iconify() {
            debug!("Iconify requested; a console cannot iconify");
        }

        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Console colour for a palette index
pub fn palette(index: u8) -> Color {
    match index {
        0 => Color::Black,
        1 => Color::DarkRed,
        2 => Color::DarkGreen,
        3 => Color::DarkYellow,
        4 => Color::DarkBlue,
        5 => Color::DarkMagenta,
        6 => Color::DarkCyan,
        7 => Color::Grey,
        8 => Color::DarkGrey,
        9 => Color::Red,
        10 => Color::Green,
        11 => Color::Yellow,
        12 => Color::Blue,
        13 => Color::Magenta,
        14 => Color::Cyan,
        15 => Color::White,
        _ => Color::Reset,
    }
}
