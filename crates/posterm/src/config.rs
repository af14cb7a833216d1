//! Command line arguments and terminal settings

use clap::{Parser, ValueEnum};
use posterm_link::MAX_READ_FAILURES;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "posterm - point-of-sale display terminal")]
pub struct Args {
    /// Server address (host:port, or a path starting with / for a Unix socket)
    pub server: String,

    /// Name reported to the server in the hello
    #[arg(short, long, default_value = "posterm")]
    pub name: String,

    /// Screen width in pixels
    #[arg(long, default_value = "1024")]
    pub width: u16,

    /// Screen height in pixels
    #[arg(long, default_value = "768")]
    pub height: u16,

    /// Pixels per character cell, horizontally
    #[arg(long, default_value = "8")]
    pub cell_width: u16,

    /// Pixels per character cell, vertically
    #[arg(long, default_value = "16")]
    pub cell_height: u16,

    /// Seconds of idle input before the screen blanks (0 disables). The
    /// server may change it later.
    #[arg(long, default_value = "0")]
    pub blank_timeout: u16,

    /// Report mouse clicks as touches
    #[arg(long)]
    pub touch: bool,

    /// Log level
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Run without drawing to the terminal
    #[arg(long)]
    pub headless: bool,
}

/// Knobs of one terminal session
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    /// Name sent in the hello
    pub name: String,

    /// Screen size in pixels
    pub width: u16,
    pub height: u16,

    /// Pixels per character cell
    pub cell_width: u16,
    pub cell_height: u16,

    /// Housekeeping timer period
    pub timer_period: Duration,

    /// Consecutive empty or failed reads before giving up
    pub max_read_failures: u32,

    /// Blank timeout in force until the server sends one
    pub blank_timeout: Option<Duration>,

    pub touch: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            name: "posterm".to_string(),
            width: 1024,
            height: 768,
            cell_width: 8,
            cell_height: 16,
            timer_period: Duration::from_millis(500),
            max_read_failures: MAX_READ_FAILURES,
            blank_timeout: None,
            touch: false,
        }
    }
}

impl TerminalConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            name: args.name.clone(),
            width: args.width,
            height: args.height,
            cell_width: args.cell_width.max(1),
            cell_height: args.cell_height.max(1),
            blank_timeout: (args.blank_timeout > 0)
                .then(|| Duration::from_secs(u64::from(args.blank_timeout))),
            touch: args.touch,
            ..Self::default()
        }
    }

    /// Character grid covering the pixel screen
    pub fn grid(&self) -> (u16, u16) {
        (
            cells_for(self.width, self.cell_width),
            cells_for(self.height, self.cell_height),
        )
    }
}

fn cells_for(pixels: u16, cell: u16) -> u16 {
    let cell = u32::from(cell.max(1));
    ((u32::from(pixels) + cell - 1) / cell) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_rounds_up() {
        let config = TerminalConfig {
            width: 100,
            height: 50,
            cell_width: 8,
            cell_height: 16,
            ..TerminalConfig::default()
        };
        assert_eq!(config.grid(), (13, 4));
    }

    #[test]
    fn test_log_level_maps_to_tracing() {
        assert_eq!(tracing::Level::from(LogLevel::Debug), tracing::Level::DEBUG);
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
    }
}
