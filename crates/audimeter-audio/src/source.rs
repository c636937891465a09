//! The behavioural contract of the microphone primitive, plus synthetic
//! sources for tests and hardware-free operation.

use std::f32::consts::TAU;

/// Errors surfaced by a PCM source while reading.
///
/// Sources fail only on unrecoverable driver conditions; everything
/// transient is absorbed below this interface.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The driver side of the source went away.
    #[error("audio source closed")]
    Closed,
    /// The source stopped delivering samples for too long.
    #[error("audio source stalled for {0} ms")]
    Stalled(u64),
}

/// A microphone-like device delivering raw 32-bit PCM at a fixed rate.
///
/// `read_block` blocks until the whole buffer is filled, so a caller can
/// assemble windows of an exact sample count without partial-read
/// bookkeeping.
pub trait PcmSource: Send {
    /// The rate the device produces samples at, in Hz.
    fn native_rate(&self) -> u32;

    /// Fills `buf` with the next contiguous samples, blocking as needed.
    fn read_block(&mut self, buf: &mut [i32]) -> Result<(), SourceError>;

    /// Drops samples buffered before this call, so the next read starts
    /// from the present.
    fn discard_backlog(&mut self) {}
}

impl<S: PcmSource + ?Sized> PcmSource for Box<S> {
    fn native_rate(&self) -> u32 {
        (**self).native_rate()
    }

    fn read_block(&mut self, buf: &mut [i32]) -> Result<(), SourceError> {
        (**self).read_block(buf)
    }

    fn discard_backlog(&mut self) {
        (**self).discard_backlog()
    }
}

/// Test and simulation waveforms for [`SyntheticSource`].
#[derive(Debug, Clone, Copy)]
pub enum Waveform {
    /// All-zero samples.
    Silence,
    /// A steady sine tone.
    Tone {
        /// Tone frequency in Hz.
        frequency: f32,
        /// Peak amplitude in the normalised range.
        amplitude: f32,
    },
    /// An amplitude-modulated tone; spectrally alive enough to clear the
    /// fingerprint confidence gate, unlike a steady tone.
    Modulated {
        /// Carrier frequency in Hz.
        carrier: f32,
        /// Envelope frequency in Hz.
        modulation: f32,
        /// Peak amplitude in the normalised range.
        amplitude: f32,
    },
}

/// A deterministic source that synthesises its waveform on demand.
///
/// Unlike real hardware it delivers faster than real time, which keeps
/// tests quick and makes hardware-free demo runs practical.
pub struct SyntheticSource {
    rate: u32,
    waveform: Waveform,
    position: u64,
}

impl SyntheticSource {
    /// Creates a source producing `waveform` at `rate` Hz.
    pub fn new(rate: u32, waveform: Waveform) -> Self {
        Self {
            rate,
            waveform,
            position: 0,
        }
    }
}

impl PcmSource for SyntheticSource {
    fn native_rate(&self) -> u32 {
        self.rate
    }

    fn read_block(&mut self, buf: &mut [i32]) -> Result<(), SourceError> {
        for slot in buf.iter_mut() {
            let value = match self.waveform {
                Waveform::Silence => 0.0,
                Waveform::Tone {
                    frequency,
                    amplitude,
                } => {
                    let t = self.position as f32 / self.rate as f32;
                    amplitude * (TAU * frequency * t).sin()
                }
                Waveform::Modulated {
                    carrier,
                    modulation,
                    amplitude,
                } => {
                    let t = self.position as f32 / self.rate as f32;
                    let envelope = 0.2 + 0.8 * (TAU * modulation * t).sin().abs();
                    amplitude * (TAU * carrier * t).sin() * envelope
                }
            };
            *slot = (value.clamp(-1.0, 1.0) * i32::MAX as f32) as i32;
            self.position += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize;

    #[test]
    fn silence_source_delivers_zeros() {
        let mut source = SyntheticSource::new(16_000, Waveform::Silence);
        let mut block = [1i32; 256];
        source.read_block(&mut block).unwrap();
        assert!(block.iter().all(|&s| s == 0));
    }

    #[test]
    fn tone_source_reaches_its_amplitude() {
        let mut source = SyntheticSource::new(
            16_000,
            Waveform::Tone {
                frequency: 1000.0,
                amplitude: 0.5,
            },
        );
        let mut block = [0i32; 16_000];
        source.read_block(&mut block).unwrap();
        let peak = block.iter().map(|&s| normalize(s).abs()).fold(0.0, f32::max);
        assert!((peak - 0.5).abs() < 0.01);
    }

    #[test]
    fn consecutive_blocks_continue_the_waveform() {
        let mut split = SyntheticSource::new(
            8000,
            Waveform::Tone {
                frequency: 440.0,
                amplitude: 0.3,
            },
        );
        let mut whole = SyntheticSource::new(
            8000,
            Waveform::Tone {
                frequency: 440.0,
                amplitude: 0.3,
            },
        );

        let mut first = [0i32; 100];
        let mut second = [0i32; 100];
        split.read_block(&mut first).unwrap();
        split.read_block(&mut second).unwrap();

        let mut reference = [0i32; 200];
        whole.read_block(&mut reference).unwrap();
        assert_eq!(&reference[..100], &first[..]);
        assert_eq!(&reference[100..], &second[..]);
    }
}
