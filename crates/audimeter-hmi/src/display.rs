//! The display contract: four text lines of 32 columns.

/// Character columns per display line.
pub const COLUMNS: usize = 32;

/// Text lines on the display.
pub const LINES: usize = 4;

/// Errors surfaced by a display driver.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    /// The underlying output device failed.
    #[error("display output failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One fully composed display image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    lines: [String; LINES],
}

impl Frame {
    /// Builds a frame, truncating each line to the display width.
    pub fn new(lines: [String; LINES]) -> Self {
        Self {
            lines: lines.map(|line| {
                if line.len() > COLUMNS {
                    line.chars().take(COLUMNS).collect()
                } else {
                    line
                }
            }),
        }
    }

    /// The rendered text lines.
    pub fn lines(&self) -> &[String; LINES] {
        &self.lines
    }
}

/// A device that can show one [`Frame`] at a time.
///
/// Drivers are owned exclusively by the display task; a draw failure is
/// treated as a fatal hardware condition.
pub trait DisplayDriver: Send {
    /// Replaces the displayed image.
    fn draw(&mut self, frame: &Frame) -> Result<(), DisplayError>;
}

/// Renders frames as a boxed panel on the terminal.
#[derive(Debug, Default)]
pub struct ConsoleDisplay;

impl DisplayDriver for ConsoleDisplay {
    fn draw(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        use std::io::Write;

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "+{}+", "-".repeat(COLUMNS))?;
        for line in frame.lines() {
            writeln!(out, "|{line:<width$}|", width = COLUMNS)?;
        }
        writeln!(out, "+{}+", "-".repeat(COLUMNS))?;
        out.flush()?;
        Ok(())
    }
}
