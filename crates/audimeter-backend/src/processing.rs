//! The processing task: fingerprint one window at a time, gate, publish.

use std::sync::Arc;

use audimeter_bridge::metrics::Counters;
use audimeter_bridge::PipelineEvent;
use tokio::sync::mpsc;

use crate::capture::CapturedWindow;
use crate::transport::Transmitter;

/// Consumes captured windows until the capture side goes away.
///
/// Processing is single-threaded and the queue holds one window, so
/// fingerprints leave in strict acquisition order. A failed publication
/// is dropped, never retried; the supervisor shows the error state and
/// the pipeline resumes with the next window.
///
/// The heavy DSP pass runs on the blocking pool so the runtime's timer
/// and I/O tasks stay responsive through a 60 s window.
pub(crate) async fn run_processing(
    mut windows: mpsc::Receiver<CapturedWindow>,
    transmitter: Transmitter,
    events: mpsc::Sender<PipelineEvent>,
    counters: Arc<Counters>,
) {
    while let Some(captured) = windows.recv().await {
        let _ = events.send(PipelineEvent::ProcessingStarted).await;

        let CapturedWindow { window, config } = captured;
        let timestamp = window.timestamp;
        let fingerprint = tokio::task::spawn_blocking(move || {
            let mut samples = window.samples;
            audimeter_dsp::generate(&mut samples, &config, timestamp)
        })
        .await
        .expect("fingerprinting task panicked");

        if !fingerprint.is_publishable() {
            let _ = events
                .send(PipelineEvent::WindowDiscarded {
                    confidence: fingerprint.confidence,
                })
                .await;
            continue;
        }

        let _ = events.send(PipelineEvent::TransmitStarted).await;
        match transmitter.publish(&fingerprint).await {
            Ok(()) => {
                counters.record_transmission();
                let _ = events.send(PipelineEvent::TransmitSucceeded).await;
            }
            Err(error) => {
                log::error!("failed to publish fingerprint: {error}");
                let _ = events.send(PipelineEvent::TransmitFailed).await;
            }
        }
    }
}
