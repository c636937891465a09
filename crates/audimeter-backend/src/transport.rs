//! Fingerprint publication to the aggregation server.

use std::time::Duration;

use audimeter_dsp::Fingerprint;
use reqwest::Url;
use serde::Serialize;
use tokio::sync::watch;

/// Build-time identifier this endpoint reports itself as.
pub const DEVICE_ID: &str = "AUDIMETER_001";

/// Ingest endpoint of the aggregation server.
pub const SERVER_URL: &str = "https://your-server.com/api/fingerprint";

/// Total budget for one publication attempt.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure taxonomy of one publication attempt.
///
/// No failure is retried; the affected fingerprint is dropped and the
/// pipeline moves on to the next window.
#[derive(Debug, thiserror::Error)]
pub enum TransmitError {
    /// The network link is not associated; no I/O was attempted.
    #[error("network link not associated")]
    NotReady,
    /// The request exceeded its total time budget.
    #[error("request timed out")]
    Timeout,
    /// The server answered with a non-success status.
    #[error("server rejected fingerprint with status {0}")]
    ServerError(u16),
    /// A socket or TLS failure below the HTTP layer.
    #[error("transport failure: {0}")]
    TransportError(#[from] reqwest::Error),
}

/// The wire object of the ingest API: the fingerprint fields plus the
/// device identifier.
#[derive(Serialize)]
struct FingerprintReport<'a> {
    device_id: &'a str,
    #[serde(flatten)]
    fingerprint: &'a Fingerprint,
}

/// HTTP client publishing fingerprints to a fixed endpoint.
pub struct Transmitter {
    client: reqwest::Client,
    endpoint: Url,
    link: watch::Receiver<bool>,
}

impl Transmitter {
    /// Creates a transmitter with the standard request budget.
    pub fn new(endpoint: Url, link: watch::Receiver<bool>) -> Self {
        Self::with_timeout(endpoint, link, REQUEST_TIMEOUT)
    }

    /// Creates a transmitter with an explicit request budget.
    pub fn with_timeout(endpoint: Url, link: watch::Receiver<bool>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            endpoint,
            link,
        }
    }

    /// Posts one fingerprint, reporting success iff the server answered
    /// 200 or 201. Without an associated link this returns immediately.
    pub async fn publish(&self, fingerprint: &Fingerprint) -> Result<(), TransmitError> {
        if !*self.link.borrow() {
            return Err(TransmitError::NotReady);
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&FingerprintReport {
                device_id: DEVICE_ID,
                fingerprint,
            })
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    TransmitError::Timeout
                } else {
                    TransmitError::TransportError(error)
                }
            })?;

        let status = response.status().as_u16();
        match status {
            200 | 201 => {
                log::info!("fingerprint accepted, status {status}");
                Ok(())
            }
            _ => Err(TransmitError::ServerError(status)),
        }
    }
}
