//! Assembles exact-length normalised windows out of raw source blocks.

use crate::resampler::{ResamplerError, StreamingResampler};
use crate::source::{PcmSource, SourceError};
use crate::{AudioWindow, READ_BLOCK, normalize, now_micros};

/// Errors that can end an acquisition cycle. All of them are
/// unrecoverable driver conditions; transient effects never surface here.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The underlying PCM source failed.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// Rate conversion to the configured sample rate failed.
    #[error(transparent)]
    Resampler(#[from] ResamplerError),
}

/// Reads contiguous windows off a PCM source at the configured rate.
///
/// The recorder owns the source exclusively; one acquisition blocks until
/// the full window is gathered and never returns a short window.
pub struct WindowRecorder<S: PcmSource> {
    source: S,
    raw: Vec<i32>,
}

impl<S: PcmSource> WindowRecorder<S> {
    /// Wraps a source for window acquisition.
    pub fn new(source: S) -> Self {
        Self {
            source,
            raw: vec![0; READ_BLOCK],
        }
    }

    /// Acquires one window of exactly `sample_rate × duration` samples.
    ///
    /// The window is stamped at the start of acquisition, and any samples
    /// the source buffered beforehand are discarded so the window reflects
    /// the present, not the backlog. When the source's native rate differs
    /// from the requested rate, the stream is resampled on the fly.
    pub fn acquire_window(
        &mut self,
        sample_rate: u32,
        duration: u16,
    ) -> Result<AudioWindow, CaptureError> {
        let needed = sample_rate as usize * duration as usize;
        let timestamp = now_micros();
        self.source.discard_backlog();

        let native_rate = self.source.native_rate();
        let mut samples = Vec::with_capacity(needed);

        if native_rate == sample_rate {
            while samples.len() < needed {
                let take = self.raw.len().min(needed - samples.len());
                self.source.read_block(&mut self.raw[..take])?;
                samples.extend(self.raw[..take].iter().map(|&s| normalize(s)));
            }
        } else {
            let mut resampler =
                StreamingResampler::new(native_rate, sample_rate, READ_BLOCK as u32)?;
            let mut scratch = vec![0.0f32; READ_BLOCK];
            while samples.len() < needed {
                self.source.read_block(&mut self.raw)?;
                for (dst, &src) in scratch.iter_mut().zip(self.raw.iter()) {
                    *dst = normalize(src);
                }
                resampler.process(&scratch, &mut samples)?;
            }
            samples.truncate(needed);
        }

        Ok(AudioWindow { samples, timestamp })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SyntheticSource, Waveform};

    #[test]
    fn window_length_is_rate_times_duration() {
        let mut recorder = WindowRecorder::new(SyntheticSource::new(16_000, Waveform::Silence));
        let window = recorder.acquire_window(16_000, 2).unwrap();
        assert_eq!(window.samples.len(), 32_000);
        assert!(window.samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn window_length_holds_across_resampling() {
        let source = SyntheticSource::new(
            44_100,
            Waveform::Tone {
                frequency: 440.0,
                amplitude: 0.4,
            },
        );
        let mut recorder = WindowRecorder::new(source);
        let window = recorder.acquire_window(16_000, 1).unwrap();
        assert_eq!(window.samples.len(), 16_000);
    }

    #[test]
    fn samples_stay_in_the_normalised_range() {
        let source = SyntheticSource::new(
            16_000,
            Waveform::Tone {
                frequency: 1000.0,
                amplitude: 1.0,
            },
        );
        let mut recorder = WindowRecorder::new(source);
        let window = recorder.acquire_window(16_000, 1).unwrap();
        assert!(window.samples.iter().all(|&s| (-1.0..=1.0).contains(&s)));
        let peak = window.samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        assert!(peak > 0.9);
    }

    #[test]
    fn timestamps_are_monotonic_across_windows() {
        let mut recorder = WindowRecorder::new(SyntheticSource::new(8000, Waveform::Silence));
        let first = recorder.acquire_window(8000, 1).unwrap();
        let second = recorder.acquire_window(8000, 1).unwrap();
        assert!(second.timestamp >= first.timestamp);
    }
}
