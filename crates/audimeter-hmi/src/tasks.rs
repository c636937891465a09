//! The two HMI tasks: periodic display refresh and button polling.

use std::sync::Arc;
use std::time::Duration;

use audimeter_bridge::config::AudioConfig;
use audimeter_bridge::metrics::Counters;
use audimeter_bridge::{PipelineEvent, StatusSnapshot};
use tokio::sync::{mpsc, watch};

use crate::display::{DisplayDriver, Frame};
use crate::input::{ButtonSource, DEBOUNCE_WINDOW, Debouncer, POLL_INTERVAL};
use crate::screens;

/// Display refresh period; the drawn state lags the supervisor by at
/// most this much.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Runs the display loop: compose every tick, draw only on change.
///
/// A draw failure is a fatal hardware condition and ends the loop.
pub async fn run_display<D: DisplayDriver>(
    mut driver: D,
    status: watch::Receiver<StatusSnapshot>,
    config: watch::Receiver<AudioConfig>,
    counters: Arc<Counters>,
) {
    let mut shown: Option<Frame> = None;
    loop {
        let frame = screens::compose(&status.borrow(), &config.borrow(), &counters.snapshot());
        if shown.as_ref() != Some(&frame) {
            if let Err(error) = driver.draw(&frame) {
                log::error!("display failed, HMI halted: {error}");
                return;
            }
            shown = Some(frame);
        }
        tokio::time::sleep(REFRESH_INTERVAL).await;
    }
}

/// Runs the button loop: poll, debounce, forward to the supervisor.
pub async fn run_buttons<B: ButtonSource>(
    mut source: B,
    events: mpsc::Sender<PipelineEvent>,
) {
    let mut debouncer = Debouncer::new(DEBOUNCE_WINDOW);
    loop {
        if let Some(button) = source.poll() {
            if debouncer.accept(button, std::time::Instant::now()) {
                log::info!("button {button:?} pressed");
                if events.send(PipelineEvent::Button(button)).await.is_err() {
                    return;
                }
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
