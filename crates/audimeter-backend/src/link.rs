//! Link layer: network association monitoring and wall-clock sanity.
//!
//! On this platform the operating system owns the actual network join,
//! so association degrades to reachability of the ingest endpoint. The
//! association state is published on a watch channel the transport layer
//! consults before every request.

use std::time::Duration;

use audimeter_bridge::PipelineEvent;
use reqwest::Url;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};

/// How often the association probe runs.
const PROBE_INTERVAL: Duration = Duration::from_secs(15);

/// Budget for one reachability probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// How often the wall clock is re-checked.
const CLOCK_SYNC_INTERVAL: Duration = Duration::from_secs(3600);

/// Seconds since the epoch at 2020-01-01; anything earlier means the
/// clock never synchronised.
const CLOCK_PLAUSIBLE_FLOOR_SECS: u64 = 1_577_836_800;

/// Spawns the association monitor probing the ingest endpoint.
///
/// Every state change is published on `link` and mirrored as a
/// [`PipelineEvent`] so the supervisor can transition.
pub(crate) fn spawn_link_monitor(
    endpoint: Url,
    link: watch::Sender<bool>,
    events: mpsc::Sender<PipelineEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut associated = false;
        loop {
            let reachable = probe(&endpoint).await;
            if reachable != associated {
                associated = reachable;
                link.send_replace(associated);
                let event = if associated {
                    log::info!("network link associated");
                    PipelineEvent::LinkUp
                } else {
                    log::warn!("network link lost, re-associating");
                    PipelineEvent::LinkDown
                };
                if events.send(event).await.is_err() {
                    return;
                }
            }
            tokio::time::sleep(PROBE_INTERVAL).await;
        }
    })
}

/// One TCP reachability probe against the endpoint's host and port.
async fn probe(endpoint: &Url) -> bool {
    let Some(host) = endpoint.host_str() else {
        return false;
    };
    let Some(port) = endpoint.port_or_known_default() else {
        return false;
    };
    matches!(
        tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}

/// Spawns the hourly wall-clock plausibility check.
///
/// Fingerprint timestamps come straight from the system clock; this task
/// only verifies the clock ever synchronised and complains otherwise.
pub(crate) fn spawn_clock_sync() -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now_secs = audimeter_audio::now_micros() / 1_000_000;
            if now_secs > CLOCK_PLAUSIBLE_FLOOR_SECS {
                log::info!("wall clock synchronised, epoch seconds {now_secs}");
            } else {
                log::warn!("wall clock not synchronised yet, retrying");
            }
            tokio::time::sleep(CLOCK_SYNC_INTERVAL).await;
        }
    })
}
