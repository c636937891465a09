//! The acquisition task: windows on a cadence, one queue slot, drop-newest.

use std::sync::Arc;
use std::time::Duration;

use audimeter_audio::recorder::WindowRecorder;
use audimeter_audio::source::PcmSource;
use audimeter_audio::AudioWindow;
use audimeter_bridge::config::AudioConfig;
use audimeter_bridge::metrics::Counters;
use audimeter_bridge::{StatusSnapshot, SystemState};
use tokio::sync::{mpsc, watch};

/// A window paired with the config snapshot that was active when its
/// acquisition started. The snapshot travels with the window so operator
/// edits never churn the parameters of work already in flight.
#[derive(Debug, Clone)]
pub(crate) struct CapturedWindow {
    pub window: AudioWindow,
    pub config: AudioConfig,
}

/// Hands a window to the processing queue, dropping the newest on
/// overflow so the in-flight window keeps its acquisition order.
pub(crate) fn enqueue_window(
    windows: &mpsc::Sender<CapturedWindow>,
    captured: CapturedWindow,
    counters: &Counters,
) -> bool {
    match windows.try_send(captured) {
        Ok(()) => {
            counters.record_sample();
            true
        }
        Err(mpsc::error::TrySendError::Full(_)) => {
            log::warn!("processing queue full, newest window dropped");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

/// Spawns the blocking capture loop.
///
/// Each cycle snapshots the config, acquires one exact-length window,
/// enqueues it, and idles for `capture_interval`. Acquisition only runs
/// while the pipeline is sampling or processing; in the menu, error
/// cooldown, or association phases the loop just keeps its cadence.
/// An unrecoverable source error halts the loop for good.
pub(crate) fn spawn_capture<S: PcmSource + 'static>(
    source: S,
    config_rx: watch::Receiver<AudioConfig>,
    status_rx: watch::Receiver<StatusSnapshot>,
    windows: mpsc::Sender<CapturedWindow>,
    counters: Arc<Counters>,
) -> tokio::task::JoinHandle<()> {
    let mut recorder = WindowRecorder::new(source);

    tokio::task::spawn_blocking(move || loop {
        let state = status_rx.borrow().state;
        if matches!(state, SystemState::Sampling | SystemState::Processing) {
            let config = *config_rx.borrow();
            log::info!(
                "starting {} s capture at {} Hz",
                config.capture_duration,
                config.sample_rate
            );

            match recorder.acquire_window(config.sample_rate, config.capture_duration) {
                Ok(window) => {
                    if windows.is_closed() {
                        return;
                    }
                    enqueue_window(&windows, CapturedWindow { window, config }, &counters);
                }
                Err(error) => {
                    log::error!("audio source failed, capture halted: {error}");
                    return;
                }
            }
        }

        let interval = config_rx.borrow().capture_interval;
        std::thread::sleep(Duration::from_secs(interval as u64));
    })
}
