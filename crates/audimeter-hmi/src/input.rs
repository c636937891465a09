//! Button input: polling contract, debounce, and the terminal stand-in.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use audimeter_bridge::Button;

/// How often the button task polls its source.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Presses of the same button closer together than this are bounce.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// A pollable source of raw (not yet debounced) button presses.
pub trait ButtonSource: Send {
    /// Returns the next pending press, if any. Never blocks.
    fn poll(&mut self) -> Option<Button>;
}

/// Per-button press rate limiter.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_navigate: Option<Instant>,
    last_edit: Option<Instant>,
}

impl Debouncer {
    /// Creates a debouncer with the given rejection window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_navigate: None,
            last_edit: None,
        }
    }

    /// Accepts or rejects a press observed at `at`.
    pub fn accept(&mut self, button: Button, at: Instant) -> bool {
        let last = match button {
            Button::Navigate => &mut self.last_navigate,
            Button::Edit => &mut self.last_edit,
        };
        match last {
            Some(previous) if at.duration_since(*previous) < self.window => false,
            _ => {
                *last = Some(at);
                true
            }
        }
    }
}

/// Reads button presses from stdin lines: `1` navigates, `2` edits.
///
/// A dedicated thread does the blocking reads so `poll` stays instant.
pub struct StdinButtons {
    presses: mpsc::Receiver<Button>,
}

impl StdinButtons {
    /// Spawns the reader thread and returns the pollable source.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut line = String::new();
            loop {
                line.clear();
                if std::io::stdin().read_line(&mut line).is_err() {
                    return;
                }
                let button = match line.trim() {
                    "1" => Button::Navigate,
                    "2" => Button::Edit,
                    _ => continue,
                };
                if tx.send(button).is_err() {
                    return;
                }
            }
        });
        Self { presses: rx }
    }
}

impl ButtonSource for StdinButtons {
    fn poll(&mut self) -> Option<Button> {
        self.presses.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounce_within_the_window_is_rejected() {
        let mut debouncer = Debouncer::new(DEBOUNCE_WINDOW);
        let t0 = Instant::now();
        assert!(debouncer.accept(Button::Navigate, t0));
        assert!(!debouncer.accept(Button::Navigate, t0 + Duration::from_millis(100)));
        assert!(debouncer.accept(Button::Navigate, t0 + Duration::from_millis(250)));
    }

    #[test]
    fn buttons_debounce_independently() {
        let mut debouncer = Debouncer::new(DEBOUNCE_WINDOW);
        let t0 = Instant::now();
        assert!(debouncer.accept(Button::Navigate, t0));
        assert!(debouncer.accept(Button::Edit, t0 + Duration::from_millis(10)));
        assert!(!debouncer.accept(Button::Edit, t0 + Duration::from_millis(20)));
    }
}
