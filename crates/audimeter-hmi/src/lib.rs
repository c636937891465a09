//! Operator HMI: a four-line display and two buttons.
//!
//! The HMI side of the bridge is deliberately thin. Buttons are polled,
//! debounced, and forwarded to the supervisor as events; the display task
//! mirrors whatever the supervisor publishes, redrawing only when the
//! composed frame actually changed. Screen composition itself is pure and
//! lives in [`screens`], so every layout is testable without hardware.

pub mod display;
pub mod input;
pub mod screens;
pub mod tasks;
