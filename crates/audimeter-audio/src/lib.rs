//! Audio acquisition for the measurement pipeline.
//!
//! This crate wraps the capture side of the system into a small set of
//! building blocks oriented toward long, contiguous window acquisition:
//! - A [`source::PcmSource`] contract for microphone-like devices that
//!   deliver raw 32-bit PCM blocks at a fixed native rate.
//! - A production line input built on `cpal` that feeds a blocking ring
//!   buffer from the audio callback ([`line_input`]).
//! - An FFT-based streaming resampler bridging the device's native rate
//!   to the configured acquisition rate ([`resampler`]).
//! - The [`recorder::WindowRecorder`] that assembles exact-length
//!   normalised windows out of raw blocks.
//!
//! # Real-time constraints
//! Audio callbacks run on a real-time thread. The capture path avoids
//! allocations and locks there; everything heavier happens on the
//! recorder's blocking thread.

pub mod line_input;
pub mod recorder;
pub mod resampler;
pub mod source;

use std::time::{SystemTime, UNIX_EPOCH};

/// Samples pulled from a source per read while filling a window.
pub(crate) const READ_BLOCK: usize = 4096;

/// One unit of work handed from capture to processing: a contiguous run
/// of normalised mono samples stamped at acquisition start.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioWindow {
    /// Samples in `[-1.0, +1.0]`, exactly `sample_rate × capture_duration`
    /// of them.
    pub samples: Vec<f32>,
    /// Microseconds since the Unix epoch at the start of acquisition.
    pub timestamp: u64,
}

/// Converts one raw 32-bit PCM sample into the normalised float range.
pub fn normalize(sample: i32) -> f32 {
    sample as f32 / i32::MAX as f32
}

/// Current wall-clock time in microseconds since the Unix epoch.
pub fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_micros() as u64)
        .unwrap_or(0)
}
