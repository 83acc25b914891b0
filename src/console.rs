//! Operator-facing console output
//!
//! Styling is an injected [`Palette`] so the pipeline never touches terminal
//! escape codes directly. [`AnsiPalette`] colors output for a terminal,
//! [`NoColor`] leaves text untouched (pipes, tests, `--no-color`).

use std::io::Write;
use std::sync::{Arc, Mutex};

/// Semantic role of a piece of console text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Phase headings and progress
    Info,
    /// Successful steps
    Success,
    /// Soft failures and notices
    Warning,
    /// Failures
    Error,
    /// Headlines
    Emphasis,
    /// Paths and locations
    Location,
}

/// Formatting capability used to style console text
pub trait Palette: Send + Sync {
    /// Wrap `text` in whatever styling `tone` calls for
    fn paint(&self, tone: Tone, text: &str) -> String;
}

/// ANSI color palette for interactive terminals
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiPalette;

impl AnsiPalette {
    const RESET: &'static str = "\x1b[0m";

    fn code(tone: Tone) -> &'static str {
        match tone {
            Tone::Info => "\x1b[0;34m",
            Tone::Success => "\x1b[0;32m",
            Tone::Warning => "\x1b[1;33m",
            Tone::Error => "\x1b[0;31m",
            Tone::Emphasis => "\x1b[1m",
            Tone::Location => "\x1b[0;36m",
        }
    }
}

impl Palette for AnsiPalette {
    fn paint(&self, tone: Tone, text: &str) -> String {
        format!("{}{}{}", Self::code(tone), text, Self::RESET)
    }
}

/// Palette that leaves text unstyled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoColor;

impl Palette for NoColor {
    fn paint(&self, _tone: Tone, text: &str) -> String {
        text.to_string()
    }
}

/// In-memory output sink that can be inspected after a run
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Everything written so far
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Line-oriented console writer
pub struct Console {
    palette: Arc<dyn Palette>,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Console {
    /// Console writing to standard output
    pub fn stdout(palette: Arc<dyn Palette>) -> Self {
        Self::with_sink(palette, Box::new(std::io::stdout()))
    }

    /// Console writing into a [`SharedBuffer`] that the caller keeps a handle to
    pub fn buffered(palette: Arc<dyn Palette>) -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Self::with_sink(palette, Box::new(buffer.clone())), buffer)
    }

    /// Console writing to an arbitrary sink
    pub fn with_sink(palette: Arc<dyn Palette>, sink: Box<dyn Write + Send>) -> Self {
        Self {
            palette,
            sink: Mutex::new(sink),
        }
    }

    /// Style `text` without printing it
    pub fn paint(&self, tone: Tone, text: &str) -> String {
        self.palette.paint(tone, text)
    }

    /// Print one styled line
    pub fn line(&self, tone: Tone, text: &str) {
        let painted = self.paint(tone, text);
        self.raw(&painted);
    }

    /// Print one line exactly as given
    pub fn raw(&self, text: &str) {
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        // Console output is best effort; a closed stdout must not abort the run.
        writeln!(sink, "{}", text).ok();
        sink.flush().ok();
    }

    /// Print an empty line
    pub fn blank(&self) {
        self.raw("");
    }

    /// Print a horizontal rule of `width` copies of `ch`
    pub fn rule(&self, tone: Tone, ch: char, width: usize) {
        let rule: String = std::iter::repeat_n(ch, width).collect();
        self.line(tone, &rule);
    }
}
