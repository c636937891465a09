//! Pipeline bring-up and task orchestration.
//!
//! This module wires together the config store, the inter-task channels,
//! and the six long-running tasks, then hands the caller the handles the
//! HMI needs to observe and steer the pipeline.

use std::sync::Arc;
use std::time::Duration;

use audimeter_audio::source::PcmSource;
use audimeter_bridge::config::AudioConfig;
use audimeter_bridge::metrics::Counters;
use audimeter_bridge::{PipelineEvent, StatusSnapshot};
use reqwest::Url;
use tokio::sync::{mpsc, watch};

use crate::capture::spawn_capture;
use crate::link::{spawn_clock_sync, spawn_link_monitor};
use crate::processing::run_processing;
use crate::store::{BlobStore, ConfigStore, StoreError};
use crate::supervisor::Supervisor;
use crate::transport::{SERVER_URL, Transmitter};

/// Capacity of the capture→processing queue: one window in flight.
const WINDOW_QUEUE_DEPTH: usize = 1;

/// Depth of the supervisor event channel.
const EVENT_QUEUE_DEPTH: usize = 32;

/// How long the boot splash stays up before association starts.
const BOOT_SPLASH: Duration = Duration::from_secs(2);

/// Cadence of the periodic stats log line.
const MONITOR_INTERVAL: Duration = Duration::from_secs(30);

/// Handles the HMI and the host binary use to observe and steer the
/// running pipeline.
pub struct PipelineHandles {
    /// Supervisor state and menu cursor, refreshed on every transition.
    pub status: watch::Receiver<StatusSnapshot>,
    /// Live config snapshots for rendering and acquisition.
    pub config: watch::Receiver<AudioConfig>,
    /// Event channel into the supervisor (button presses go here).
    pub events: mpsc::Sender<PipelineEvent>,
    /// The config store the menu edits route through.
    pub store: ConfigStore,
    /// Monotonic runtime totals.
    pub counters: Arc<Counters>,
}

/// Boots the measurement pipeline on the given audio source.
///
/// Loads the persisted config, spawns the supervisor, capture,
/// processing, link, clock-sync, and monitor tasks, and schedules the
/// hardware-ready hand-off after a short boot splash. Storage failures at
/// this point are fatal; a corrupt config image is not (the store falls
/// back to defaults).
pub async fn start<S: PcmSource + 'static>(source: S) -> Result<PipelineHandles, StoreError> {
    let store = ConfigStore::new(BlobStore::open()?);
    store.load().await;
    log_boot_config(&store.snapshot());

    let (windows_tx, windows_rx) = mpsc::channel(WINDOW_QUEUE_DEPTH);
    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let (status_tx, status_rx) = watch::channel(StatusSnapshot::default());
    let (link_tx, link_rx) = watch::channel(false);

    let endpoint = Url::parse(SERVER_URL).expect("failed to parse server url");
    let transmitter = Transmitter::new(endpoint.clone(), link_rx.clone());
    let counters = Arc::new(Counters::default());

    tokio::spawn(Supervisor::new(status_tx, store.clone(), link_rx.clone()).run(events_rx));
    spawn_capture(
        source,
        store.subscribe(),
        status_rx.clone(),
        windows_tx,
        counters.clone(),
    );
    tokio::spawn(run_processing(
        windows_rx,
        transmitter,
        events_tx.clone(),
        counters.clone(),
    ));
    spawn_link_monitor(endpoint, link_tx, events_tx.clone());
    spawn_clock_sync();
    spawn_system_monitor(status_rx.clone(), counters.clone());

    // Leave the splash screen up briefly, then let the supervisor move
    // on to association; the loaded config is written back once so a
    // fresh device persists its defaults.
    let boot_events = events_tx.clone();
    let boot_store = store.clone();
    tokio::spawn(async move {
        tokio::time::sleep(BOOT_SPLASH).await;
        let _ = boot_events.send(PipelineEvent::HardwareReady).await;
        if let Err(error) = boot_store.persist().await {
            log::warn!("failed to persist boot configuration: {error}");
        }
    });

    Ok(PipelineHandles {
        status: status_rx,
        config: store.subscribe(),
        events: events_tx,
        store,
        counters,
    })
}

fn log_boot_config(config: &AudioConfig) {
    log::info!("sample rate: {} Hz", config.sample_rate);
    log::info!("fft size: {} points", config.fft_size);
    log::info!("band energies: {}", config.n_mels);
    log::info!("capture duration: {} s", config.capture_duration);
    log::info!("capture interval: {} s", config.capture_interval);
    log::info!("quality level: {}/5", config.quality_level);
}

/// Spawns the periodic stats logger.
fn spawn_system_monitor(
    status: watch::Receiver<StatusSnapshot>,
    counters: Arc<Counters>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(MONITOR_INTERVAL).await;
            let totals = counters.snapshot();
            log::info!(
                "stats - samples: {}, sent: {}, state: {}",
                totals.samples_processed,
                totals.transmissions_sent,
                status.borrow().state
            );
        }
    })
}
