use std::io::Write;

use audimeter_audio::line_input::{CaptureDevice, LineInput, list_capture_devices};
use audimeter_audio::source::{PcmSource, SyntheticSource, Waveform};
use audimeter_hmi::display::ConsoleDisplay;
use audimeter_hmi::input::StdinButtons;

/// Native rate of the synthetic source used by `--simulate`.
const SIMULATED_RATE: u32 = 48_000;

fn prompt_select_capture_device(host: &cpal::Host) -> CaptureDevice {
    let devices = list_capture_devices(host).expect("failed to list host input devices");
    for (index, device) in devices.iter().enumerate() {
        println!("[SELECT] {}. Input device: {device}", index + 1);
    }

    print!("[INFO] Select the capture device to use: ");
    std::io::stdout().flush().unwrap();

    let mut capture_device_index = String::new();
    if let Err(e) = std::io::stdin().read_line(&mut capture_device_index) {
        panic!("failed to read line: {}", e);
    }

    let capture_device_index = capture_device_index
        .trim()
        .parse::<usize>()
        .expect("invalid input")
        - 1;

    match devices.get(capture_device_index) {
        Some(device) => device.clone(),
        None => panic!("no device found at index {}", capture_device_index + 1),
    }
}

#[tokio::main]
async fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .expect("failed to create logger instance");

    let source: Box<dyn PcmSource> = if std::env::args().any(|arg| arg == "--simulate") {
        log::info!("using a synthetic capture source");
        Box::new(SyntheticSource::new(
            SIMULATED_RATE,
            Waveform::Modulated {
                carrier: 997.0,
                modulation: 3.0,
                amplitude: 0.5,
            },
        ))
    } else {
        let capture_device = prompt_select_capture_device(&cpal::default_host());
        println!("[INFO] Using capture device: {capture_device}");
        Box::new(LineInput::open(&capture_device).expect("failed to open capture device"))
    };

    let handles = audimeter_backend::start(source)
        .await
        .expect("failed to start measurement pipeline");

    tokio::spawn(audimeter_hmi::tasks::run_display(
        ConsoleDisplay,
        handles.status.clone(),
        handles.config.clone(),
        handles.counters.clone(),
    ));
    tokio::spawn(audimeter_hmi::tasks::run_buttons(
        StdinButtons::spawn(),
        handles.events.clone(),
    ));

    // Power-off is the terminal state; run until interrupted.
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown");
}
