//! Backend of the audience measurement endpoint.
//!
//! This crate owns the pipeline lifecycle: the config store and its
//! non-volatile persistence, the capture and processing tasks around the
//! single-slot window queue, the transport client, the link layer, and
//! the supervisor that publishes every state transition the HMI renders.

mod capture;
mod link;
mod processing;
mod runtime;
mod store;
mod supervisor;
mod transport;

pub use crate::runtime::{PipelineHandles, start};
pub use crate::store::{BlobStore, ConfigStore, StoreError};
pub use crate::supervisor::ERROR_COOLDOWN;
pub use crate::transport::{DEVICE_ID, SERVER_URL, Transmitter, TransmitError};
