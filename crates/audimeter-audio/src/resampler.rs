//! FFT-based streaming resampling between the device's native rate and
//! the configured acquisition rate.

use std::collections::VecDeque;

use rubato::{FftFixedInOut, Resampler};

/// Errors that can occur while resampling a capture stream.
#[derive(Debug, thiserror::Error)]
pub enum ResamplerError {
    /// The resampling engine could not be constructed for the requested
    /// rate pair.
    #[error("failed to construct resampler: {0}")]
    Construction(#[from] rubato::ResamplerConstructionError),
    /// The resampling engine failed while processing samples.
    #[error("failed to resample input samples: {0}")]
    Resample(#[from] rubato::ResampleError),
}

/// Streaming mono resampler accepting arbitrary input block sizes.
///
/// Incoming samples are queued until a full engine chunk is available;
/// output is appended to the caller's buffer as soon as it is produced.
/// Construction allocates; processing does not, apart from queue growth
/// on unusually large bursts.
pub struct StreamingResampler {
    resampler: FftFixedInOut<f32>,
    pending: VecDeque<f32>,
    input: Vec<f32>,
    output: Vec<f32>,
}

impl StreamingResampler {
    /// Creates a resampler converting `original_rate` to `target_rate`.
    ///
    /// `block_size` steers the internal FFT chunk size, trading latency
    /// against throughput; it does not constrain callers.
    pub fn new(
        original_rate: u32,
        target_rate: u32,
        block_size: u32,
    ) -> Result<Self, ResamplerError> {
        let resampler = FftFixedInOut::new(
            original_rate as usize,
            target_rate as usize,
            block_size as usize,
            1, // mono capture path
        )?;

        let input = resampler.input_buffer_allocate(true).remove(0);
        let output = resampler.output_buffer_allocate(true).remove(0);

        Ok(Self {
            resampler,
            pending: VecDeque::with_capacity(input.len() * 2),
            input,
            output,
        })
    }

    /// Queues `input` and appends every full chunk of resampled output
    /// to `out`, returning the number of samples appended.
    pub fn process(&mut self, input: &[f32], out: &mut Vec<f32>) -> Result<usize, ResamplerError> {
        self.pending.extend(input);
        let mut total_written = 0usize;

        loop {
            let wanted = self.resampler.input_frames_next();
            if self.pending.len() < wanted {
                break;
            }

            self.input.resize(wanted, 0.0);
            for slot in self.input.iter_mut() {
                *slot = self.pending.pop_front().unwrap_or(0.0);
            }

            let (_, written) = self.resampler.process_into_buffer(
                &[&self.input],
                &mut [&mut self.output],
                None,
            )?;
            out.extend_from_slice(&self.output[..written]);
            total_written += written;
        }

        Ok(total_written)
    }
}
