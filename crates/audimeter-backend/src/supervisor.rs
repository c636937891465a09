//! Pipeline lifecycle supervision.
//!
//! The supervisor is the single writer of [`SystemState`]. Every other
//! task asks for transitions by posting a [`PipelineEvent`]; the resulting
//! state (plus the config-menu cursor) is published on a watch channel
//! the display task mirrors.

use std::time::Duration;

use audimeter_bridge::config::{MENU_ITEM_COUNT, MenuItem};
use audimeter_bridge::{Button, PipelineEvent, StatusSnapshot, SystemState};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::store::ConfigStore;

/// How long the pipeline lingers in `Error` before resuming on its own.
pub const ERROR_COOLDOWN: Duration = Duration::from_secs(5);

pub(crate) struct Supervisor {
    state: SystemState,
    menu_index: u8,
    hardware_ready: bool,
    cooldown: Option<Instant>,
    status: watch::Sender<StatusSnapshot>,
    store: ConfigStore,
    link: watch::Receiver<bool>,
}

impl Supervisor {
    pub(crate) fn new(
        status: watch::Sender<StatusSnapshot>,
        store: ConfigStore,
        link: watch::Receiver<bool>,
    ) -> Self {
        Self {
            state: SystemState::Init,
            menu_index: 0,
            hardware_ready: false,
            cooldown: None,
            status,
            store,
            link,
        }
    }

    /// Consumes events until every sender is gone.
    pub(crate) async fn run(mut self, mut events: mpsc::Receiver<PipelineEvent>) {
        loop {
            let event = if let Some(deadline) = self.cooldown {
                tokio::select! {
                    maybe = events.recv() => match maybe {
                        Some(event) => Some(event),
                        None => break,
                    },
                    _ = tokio::time::sleep_until(deadline) => None,
                }
            } else {
                match events.recv().await {
                    Some(event) => Some(event),
                    None => break,
                }
            };

            match event {
                Some(event) => self.handle(event).await,
                // Cooldown elapsed with no event.
                None => self.recover(),
            }
        }
    }

    /// Applies one event to the state machine and publishes the result.
    pub(crate) async fn handle(&mut self, event: PipelineEvent) {
        use PipelineEvent::*;
        use SystemState::*;

        match event {
            HardwareReady => {
                self.hardware_ready = true;
                if self.state == Init {
                    self.enter(Connecting);
                }
            }
            LinkUp => {
                if self.state == Connecting {
                    self.enter(Sampling);
                }
            }
            LinkDown => {
                // The menu keeps working offline; everything else falls
                // back to association.
                if !matches!(self.state, Config | Init) {
                    self.cooldown = None;
                    self.enter(Connecting);
                }
            }
            ProcessingStarted => {
                if self.state == Sampling {
                    self.enter(Processing);
                }
            }
            WindowDiscarded { confidence } => {
                log::warn!("fingerprint discarded, confidence {confidence:.2}");
                if self.state == Processing {
                    self.enter(Sampling);
                }
            }
            TransmitStarted => {
                if self.state == Processing {
                    self.enter(Transmitting);
                }
            }
            TransmitSucceeded => {
                if self.state == Transmitting {
                    self.enter(Sampling);
                }
            }
            TransmitFailed => {
                if self.state == Transmitting {
                    self.cooldown = Some(Instant::now() + ERROR_COOLDOWN);
                    self.enter(Error);
                }
            }
            Button(button) => self.handle_button(button).await,
        }
    }

    async fn handle_button(&mut self, button: Button) {
        use SystemState::*;

        match (button, self.state) {
            (Button::Navigate, Config) => {
                self.menu_index = (self.menu_index + 1) % MENU_ITEM_COUNT;
                self.publish();
            }
            (Button::Navigate, Error) => self.recover(),
            (Button::Navigate, Sampling | Processing | Transmitting) => {
                self.menu_index = 0;
                self.enter(Config);
            }
            (Button::Navigate, Init | Connecting) => {}
            (Button::Edit, Config) => match MenuItem::from_index(self.menu_index) {
                MenuItem::Exit => {
                    if let Err(error) = self.store.persist().await {
                        log::warn!("failed to persist configuration: {error}");
                    }
                    self.enter(Sampling);
                }
                item => {
                    self.store.advance(item);
                    self.publish();
                }
            },
            (Button::Edit, _) => {}
        }
    }

    /// Leaves `Error` for wherever the link allows.
    fn recover(&mut self) {
        self.cooldown = None;
        if self.state != SystemState::Error {
            return;
        }
        let target = if *self.link.borrow() {
            SystemState::Sampling
        } else {
            SystemState::Connecting
        };
        self.enter(target);
    }

    fn enter(&mut self, next: SystemState) {
        if next != SystemState::Error {
            self.cooldown = None;
        }
        if self.state != next {
            log::info!("state {} -> {next}", self.state);
            self.state = next;
        }
        self.publish();
    }

    fn publish(&self) {
        let snapshot = StatusSnapshot {
            state: self.state,
            menu_index: self.menu_index,
        };
        if *self.status.borrow() != snapshot {
            let _ = self.status.send(snapshot);
        }
    }
}
