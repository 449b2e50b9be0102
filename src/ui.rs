//! User-facing output sinks
//!
//! Diagnostics go through `tracing`; anything the user is meant to read goes
//! through a [`Ui`].

use std::io::Write;
use std::sync::{Arc, Mutex};

/// Severity of a line written to a [`Ui`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// Output sink for a single invocation
pub trait Ui: Send + Sync {
    /// Write one message at the given level
    fn say(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.say(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.say(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.say(Level::Error, message);
    }
}

/// Writes info to stdout and everything else to stderr
#[derive(Debug, Default)]
pub struct ConsoleUi;

impl Ui for ConsoleUi {
    fn say(&self, level: Level, message: &str) {
        // A closed pipe is not worth failing the invocation over.
        let _ = match level {
            Level::Info => writeln!(std::io::stdout().lock(), "{message}"),
            Level::Warn | Level::Error => writeln!(std::io::stderr().lock(), "{message}"),
        };
    }
}

/// Captures everything written to it; used by tests and by callers that
/// need the rendered output as data.
#[derive(Debug, Default, Clone)]
pub struct BufferUi {
    lines: Arc<Mutex<Vec<(Level, String)>>>,
}

impl BufferUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured messages, in order
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Captured messages joined with newlines, levels dropped
    pub fn output(&self) -> String {
        self.lines()
            .into_iter()
            .map(|(_, line)| line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Ui for BufferUi {
    fn say(&self, level: Level, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, message.to_string()));
        }
    }
}
