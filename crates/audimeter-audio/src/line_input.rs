//! Production capture path: a cpal input stream feeding a blocking ring
//! buffer that the recorder drains as raw 32-bit PCM.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Host;
use ringbuf_blocking::{
    BlockingHeapRb,
    traits::{Consumer, Producer, Split},
};

use crate::source::{PcmSource, SourceError};

/// Seconds of headroom the capture ring holds at the native rate.
const RING_SECONDS: u32 = 2;

/// Sleep between empty polls of the capture ring.
const POLL_MS: u64 = 2;

/// How long the ring may stay empty before the source counts as stalled.
const STALL_TIMEOUT_MS: u64 = 5000;

/// Errors that can occur while setting up or reading the line input.
#[derive(Debug, thiserror::Error)]
pub enum LineInputError {
    /// Failed to enumerate audio input devices on the host.
    #[error("failed to read device's information: {0}")]
    ReadDevices(#[from] cpal::DevicesError),
    /// Failed to obtain the device's default input configuration.
    #[error("failed to build device config: {0}")]
    BuildStreamConfig(#[from] cpal::DefaultStreamConfigError),
    /// The audio backend rejected the input stream configuration.
    #[error("failed to build device input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    /// The input stream refused to start.
    #[error("failed to start device input stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
    /// The stream worker thread died before reporting readiness.
    #[error("input stream worker exited before it became ready")]
    WorkerGone,
}

/// An input-capable device on the active audio host.
#[derive(Clone)]
pub struct CaptureDevice {
    /// Human-readable device description.
    pub description: String,

    device: cpal::Device,
}

impl std::fmt::Display for CaptureDevice {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.description)
    }
}

/// Returns every input-capable device available on the given host.
pub fn list_capture_devices(host: &Host) -> Result<Vec<CaptureDevice>, LineInputError> {
    Ok(host
        .input_devices()?
        .map(|device| CaptureDevice {
            description: device
                .name()
                .expect("failed to obtain device's information")
                .to_string(),
            device,
        })
        .collect())
}

/// Internal erasure of the concrete ring-buffer consumer type.
trait BlockConsumer: Send {
    fn pop(&mut self, buf: &mut [i32]) -> usize;
}

impl<C> BlockConsumer for C
where
    C: Consumer<Item = i32> + Send,
{
    fn pop(&mut self, buf: &mut [i32]) -> usize {
        self.pop_slice(buf)
    }
}

/// Continuous microphone capture backed by a cpal input stream.
///
/// The audio callback extracts the left channel of the interleaved
/// stream, scales it to raw 32-bit PCM, and pushes it into the ring.
/// Between window acquisitions nobody drains the ring, so it is allowed
/// to overrun; the recorder discards that backlog before each window.
pub struct LineInput {
    native_rate: u32,
    consumer: Box<dyn BlockConsumer>,
}

impl LineInput {
    /// Opens a capture stream on the device using its default input
    /// configuration. The stream lives on its own thread because stream
    /// handles cannot migrate across threads.
    pub fn open(device: &CaptureDevice) -> Result<Self, LineInputError> {
        let supported = device.device.default_input_config()?;
        let native_rate = supported.sample_rate().0;
        let stream_config: cpal::StreamConfig = supported.into();

        let ring = BlockingHeapRb::<i32>::new((native_rate * RING_SECONDS) as usize);
        let (producer, consumer) = ring.split();

        let (ready_tx, ready_rx) = mpsc::channel();
        spawn_stream_worker(device.device.clone(), stream_config, producer, ready_tx);
        ready_rx.recv().map_err(|_| LineInputError::WorkerGone)??;

        log::info!(
            "line input open on \"{}\" at {native_rate} Hz",
            device.description
        );
        Ok(Self {
            native_rate,
            consumer: Box::new(consumer),
        })
    }
}

impl PcmSource for LineInput {
    fn native_rate(&self) -> u32 {
        self.native_rate
    }

    fn read_block(&mut self, buf: &mut [i32]) -> Result<(), SourceError> {
        let mut filled = 0;
        let mut idle_ms = 0u64;
        while filled < buf.len() {
            let got = self.consumer.pop(&mut buf[filled..]);
            if got == 0 {
                if idle_ms >= STALL_TIMEOUT_MS {
                    return Err(SourceError::Stalled(idle_ms));
                }
                thread::sleep(Duration::from_millis(POLL_MS));
                idle_ms += POLL_MS;
                continue;
            }
            idle_ms = 0;
            filled += got;
        }
        Ok(())
    }

    fn discard_backlog(&mut self) {
        let mut sink = [0i32; 1024];
        while self.consumer.pop(&mut sink) > 0 {}
    }
}

/// Builds and plays the input stream on a dedicated thread, reporting
/// readiness (or the setup failure) back through `ready`.
fn spawn_stream_worker(
    device: cpal::Device,
    config: cpal::StreamConfig,
    mut producer: impl Producer<Item = i32> + Send + 'static,
    ready: mpsc::Sender<Result<(), LineInputError>>,
) {
    thread::spawn(move || {
        let channels = (config.channels as usize).max(1);
        let mut staging: Vec<i32> = Vec::with_capacity(crate::READ_BLOCK);

        let built = device.build_input_stream(
            &config,
            move |data: &[f32], _| {
                staging.clear();
                for frame in data.chunks_exact(channels) {
                    staging.push((frame[0].clamp(-1.0, 1.0) * i32::MAX as f32) as i32);
                }
                // Non-blocking push; whatever does not fit is backlog the
                // recorder would discard anyway.
                let _ = producer.push_slice(&staging);
            },
            |error| {
                log::error!("an error occured while processing the input stream data: {error}");
            },
            None,
        );

        let stream = match built {
            Ok(stream) => stream,
            Err(error) => {
                let _ = ready.send(Err(error.into()));
                return;
            }
        };
        if let Err(error) = stream.play() {
            let _ = ready.send(Err(error.into()));
            return;
        }
        let _ = ready.send(Ok(()));

        // The stream stays alive as long as this thread parks.
        loop {
            thread::park();
        }
    });
}
