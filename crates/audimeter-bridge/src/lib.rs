//! Shared types connecting the measurement pipeline and the operator HMI.
//!
//! This crate defines the vocabulary the other crates communicate with:
//! - The lifecycle [`SystemState`] published by the pipeline supervisor.
//! - [`PipelineEvent`]s flowing from the capture/processing/link tasks and
//!   the button handler into the supervisor.
//! - The live [`config::AudioConfig`] tuning parameters, their validation
//!   rules, quality presets, and the cyclic per-item steppers driven by the
//!   HMI edit button.
//! - Monotonic runtime [`metrics::Counters`].
//!
//! The design is deliberately message-driven: tasks never mutate a shared
//! state variable directly. They post events over bounded
//! [`tokio::sync::mpsc`] channels and observe snapshots over
//! [`tokio::sync::watch`] channels.

pub mod config;
pub mod metrics;

/// Lifecycle states of the measurement endpoint.
///
/// The supervisor holds exactly one of these at a time and publishes every
/// transition on a watch channel so the display can mirror it within one
/// refresh period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    /// Hardware bring-up in progress.
    Init,
    /// Waiting for network association.
    Connecting,
    /// Acquiring ambient audio on the configured cadence.
    Sampling,
    /// Condensing a captured window into a fingerprint.
    Processing,
    /// Posting a fingerprint to the aggregation server.
    Transmitting,
    /// Operator configuration menu is open.
    Config,
    /// A transient failure occurred; recovers after a cooldown.
    Error,
}

impl std::fmt::Display for SystemState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SystemState::Init => "Init",
            SystemState::Connecting => "Connecting",
            SystemState::Sampling => "Sampling",
            SystemState::Processing => "Processing",
            SystemState::Transmitting => "Transmitting",
            SystemState::Config => "Config",
            SystemState::Error => "Error",
        };
        write!(formatter, "{name}")
    }
}

/// The two operator input buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Navigate: open the config menu, advance the cursor, or reset from
    /// an error.
    Navigate,
    /// Edit: advance the selected parameter, or leave the menu on "Exit".
    Edit,
}

/// Events posted to the pipeline supervisor by the other tasks.
///
/// The supervisor is the only writer of [`SystemState`]; everything that
/// wants a transition asks for one through this enum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PipelineEvent {
    /// Audio source and display came up successfully.
    HardwareReady,
    /// The network link became associated.
    LinkUp,
    /// The network link was lost.
    LinkDown,
    /// The processing task picked a window off the queue.
    ProcessingStarted,
    /// A window was gated out before transmission.
    WindowDiscarded {
        /// Confidence the discarded fingerprint scored.
        confidence: f32,
    },
    /// A fingerprint cleared the publish threshold and is being posted.
    TransmitStarted,
    /// The server accepted the fingerprint.
    TransmitSucceeded,
    /// The transport layer reported a failure; the fingerprint is dropped.
    TransmitFailed,
    /// A debounced button press from the HMI.
    Button(Button),
}

/// Snapshot published by the supervisor after every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Current lifecycle state.
    pub state: SystemState,
    /// Cursor position inside the config menu; meaningful only while
    /// `state` is [`SystemState::Config`].
    pub menu_index: u8,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            state: SystemState::Init,
            menu_index: 0,
        }
    }
}
