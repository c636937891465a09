//! Pure screen composition: one layout per lifecycle state.

use audimeter_bridge::config::{AudioConfig, MenuItem};
use audimeter_bridge::metrics::CounterSnapshot;
use audimeter_bridge::{StatusSnapshot, SystemState};

use crate::display::Frame;

/// Composes the frame for the current supervisor status.
pub fn compose(
    status: &StatusSnapshot,
    config: &AudioConfig,
    counters: &CounterSnapshot,
) -> Frame {
    let lines = match status.state {
        SystemState::Init => [
            String::from("TV Audience Monitor"),
            String::from("Initialising..."),
            format!("Quality: {}/5", config.quality_level),
            String::new(),
        ],
        SystemState::Connecting => [
            String::from("Connecting"),
            String::from("Please wait..."),
            String::new(),
            String::new(),
        ],
        SystemState::Sampling => [
            String::from("Capturing Audio"),
            format!("SR: {}kHz", config.sample_rate / 1000),
            format!("Samples: {}", counters.samples_processed),
            format!("Sent: {}", counters.transmissions_sent),
        ],
        SystemState::Processing => [
            String::from("Processing..."),
            format!("FFT: {} pts", config.fft_size),
            format!("MFCC: {} coef", config.n_mels),
            String::from("Generating hash"),
        ],
        SystemState::Transmitting => [
            String::from("Transmitting"),
            String::from("Sending data"),
            String::from("to server"),
            String::new(),
        ],
        SystemState::Config => {
            let item = MenuItem::from_index(status.menu_index);
            [
                String::from("CONFIGURATION"),
                format!(">{}", item.label()),
                format!(" {}", item_value(item, config)),
                String::from("B1:Nav B2:Edit/Exit"),
            ]
        }
        SystemState::Error => [
            String::from("ERROR"),
            String::from("Check connection"),
            String::from("or configuration"),
            String::from("B1: Retry"),
        ],
    };
    Frame::new(lines)
}

/// Renders the current value of a menu item.
fn item_value(item: MenuItem, config: &AudioConfig) -> String {
    match item {
        MenuItem::SampleRate => format!("{} Hz", config.sample_rate),
        MenuItem::FftSize => format!("{} points", config.fft_size),
        MenuItem::MelCoefficients => format!("{} coef", config.n_mels),
        MenuItem::CaptureDuration => format!("{} sec", config.capture_duration),
        MenuItem::CaptureInterval => format!("{} sec", config.capture_interval),
        MenuItem::NoiseThreshold => format!("{:.3}", config.noise_threshold),
        MenuItem::QualityLevel => format!("{}/5", config.quality_level),
        MenuItem::Exit => String::from("Press B2"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: SystemState) -> StatusSnapshot {
        StatusSnapshot {
            state,
            menu_index: 0,
        }
    }

    #[test]
    fn sampling_screen_shows_the_runtime_metrics() {
        let counters = CounterSnapshot {
            samples_processed: 12,
            transmissions_sent: 7,
        };
        let frame = compose(
            &status(SystemState::Sampling),
            &AudioConfig::default(),
            &counters,
        );
        assert_eq!(frame.lines()[0], "Capturing Audio");
        assert_eq!(frame.lines()[1], "SR: 16kHz");
        assert_eq!(frame.lines()[2], "Samples: 12");
        assert_eq!(frame.lines()[3], "Sent: 7");
    }

    #[test]
    fn every_state_renders_its_name_line() {
        let config = AudioConfig::default();
        let counters = CounterSnapshot::default();
        let expectations = [
            (SystemState::Init, "TV Audience Monitor"),
            (SystemState::Connecting, "Connecting"),
            (SystemState::Sampling, "Capturing Audio"),
            (SystemState::Processing, "Processing..."),
            (SystemState::Transmitting, "Transmitting"),
            (SystemState::Config, "CONFIGURATION"),
            (SystemState::Error, "ERROR"),
        ];
        for (state, first_line) in expectations {
            let frame = compose(&status(state), &config, &counters);
            assert_eq!(frame.lines()[0], first_line);
        }
    }

    #[test]
    fn config_screen_follows_the_cursor() {
        let config = AudioConfig::default();
        let counters = CounterSnapshot::default();

        let frame = compose(
            &StatusSnapshot {
                state: SystemState::Config,
                menu_index: 0,
            },
            &config,
            &counters,
        );
        assert_eq!(frame.lines()[1], ">Sample Rate");
        assert_eq!(frame.lines()[2], " 16000 Hz");

        let frame = compose(
            &StatusSnapshot {
                state: SystemState::Config,
                menu_index: 5,
            },
            &config,
            &counters,
        );
        assert_eq!(frame.lines()[1], ">Noise Floor");
        assert_eq!(frame.lines()[2], " 0.010");

        let frame = compose(
            &StatusSnapshot {
                state: SystemState::Config,
                menu_index: 7,
            },
            &config,
            &counters,
        );
        assert_eq!(frame.lines()[1], ">Exit Config");
        assert_eq!(frame.lines()[3], "B1:Nav B2:Edit/Exit");
    }

    #[test]
    fn processing_screen_reflects_dsp_parameters() {
        let frame = compose(
            &status(SystemState::Processing),
            &AudioConfig::default(),
            &CounterSnapshot::default(),
        );
        assert_eq!(frame.lines()[1], "FFT: 1024 pts");
        assert_eq!(frame.lines()[2], "MFCC: 13 coef");
    }
}
