//! Runtime settings negotiated over the stream

use std::collections::HashMap;
use std::time::Duration;

/// Knobs the server can change while connected
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    /// Idle time before the screensaver starts; `None` never blanks
    pub blank_timeout: Option<Duration>,
    /// Silence from the server after which the connection is given up
    pub conn_timeout: Option<Duration>,
    /// Pointer shape last requested
    pub cursor: u8,
}

impl Settings {
    /// Seconds from the wire, where zero disables the timeout
    pub fn timeout_from_secs(secs: u16) -> Option<Duration> {
        (secs > 0).then(|| Duration::from_secs(u64::from(secs)))
    }
}

/// Server-supplied replacements for display strings
#[derive(Debug, Clone, Default)]
pub struct Translations {
    table: HashMap<String, String>,
}

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole table
    pub fn reload<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.table = pairs.into_iter().collect();
    }

    /// The translation of `text`, or `text` itself
    pub fn lookup<'a>(&'a self, text: &'a str) -> &'a str {
        self.table.get(text).map_or(text, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
