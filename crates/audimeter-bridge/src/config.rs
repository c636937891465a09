//! Live tuning parameters for the acquisition and fingerprinting pipeline.
//!
//! The config is treated as an immutable snapshot: mutations build a
//! candidate, validate it, and swap it in whole. A window that is already in
//! flight keeps the snapshot that was active when its acquisition started.

use serde::{Deserialize, Serialize};

/// Number of entries in the operator config menu, including "Exit".
pub const MENU_ITEM_COUNT: u8 = 8;

/// Errors produced by config validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A parameter landed outside its declared range.
    #[error("parameter out of range: {0}")]
    OutOfRange(&'static str),
    /// The FFT length is not a power of two.
    #[error("fft_size must be a power of two, got {0}")]
    FftNotPowerOfTwo(u16),
    /// The hop does not fit inside one FFT frame.
    #[error("hop_length {hop} exceeds fft_size {fft}")]
    HopExceedsFrame {
        /// Configured hop length.
        hop: u16,
        /// Configured FFT length.
        fft: u16,
    },
    /// The analysis band is empty or extends past the Nyquist frequency.
    #[error("invalid analysis band {min}..{max} Hz at {rate} Hz")]
    InvalidBand {
        /// Lower band edge in Hz.
        min: f32,
        /// Upper band edge in Hz.
        max: f32,
        /// Sample rate in Hz.
        rate: u32,
    },
}

/// Tuning parameters for one acquisition/fingerprinting cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Acquisition sample rate in Hz.
    pub sample_rate: u32,
    /// FFT frame length in samples. Always a power of two.
    pub fft_size: u16,
    /// Advance between successive analysis frames in samples.
    pub hop_length: u16,
    /// Number of pooled band energies per fingerprint.
    pub n_mels: u16,
    /// Lower edge of the pooled frequency band in Hz.
    pub min_freq: f32,
    /// Upper edge of the pooled frequency band in Hz.
    pub max_freq: f32,
    /// Length of one captured window in seconds.
    pub capture_duration: u16,
    /// Idle time between windows in seconds.
    pub capture_interval: u16,
    /// Mean-square energy floor below which a window counts as noise.
    pub noise_threshold: f32,
    /// Quality preset level, 1 (lowest load) to 5 (highest fidelity).
    pub quality_level: u8,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            fft_size: 1024,
            hop_length: 512,
            n_mels: 13,
            min_freq: 300.0,
            max_freq: 8000.0,
            capture_duration: 30,
            capture_interval: 60,
            noise_threshold: 0.01,
            quality_level: 3,
        }
    }
}

impl AudioConfig {
    /// Number of samples in one captured window.
    pub fn samples_per_window(&self) -> usize {
        self.sample_rate as usize * self.capture_duration as usize
    }

    /// Checks every parameter against its declared range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.sample_rate, 8000 | 16_000 | 22_050 | 44_100) {
            return Err(ConfigError::OutOfRange("sample_rate"));
        }
        if !self.fft_size.is_power_of_two() {
            return Err(ConfigError::FftNotPowerOfTwo(self.fft_size));
        }
        if !(512..=2048).contains(&self.fft_size) {
            return Err(ConfigError::OutOfRange("fft_size"));
        }
        if self.hop_length == 0 {
            return Err(ConfigError::OutOfRange("hop_length"));
        }
        if self.hop_length > self.fft_size {
            return Err(ConfigError::HopExceedsFrame {
                hop: self.hop_length,
                fft: self.fft_size,
            });
        }
        if !(10..=20).contains(&self.n_mels) {
            return Err(ConfigError::OutOfRange("n_mels"));
        }
        if !(15..=60).contains(&self.capture_duration) {
            return Err(ConfigError::OutOfRange("capture_duration"));
        }
        if !(30..=300).contains(&self.capture_interval) {
            return Err(ConfigError::OutOfRange("capture_interval"));
        }
        if !(self.noise_threshold > 0.0 && self.noise_threshold <= 0.1) {
            return Err(ConfigError::OutOfRange("noise_threshold"));
        }
        if !(1..=5).contains(&self.quality_level) {
            return Err(ConfigError::OutOfRange("quality_level"));
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        if !(self.min_freq >= 0.0 && self.min_freq < self.max_freq && self.max_freq <= nyquist) {
            return Err(ConfigError::InvalidBand {
                min: self.min_freq,
                max: self.max_freq,
                rate: self.sample_rate,
            });
        }
        Ok(())
    }

    /// Overwrites the five preset-controlled fields for the given quality
    /// level and records the level itself.
    ///
    /// The band ceiling is pulled down to the Nyquist limit where the preset
    /// sample rate requires it.
    pub fn apply_preset(&mut self, level: u8) -> Result<(), ConfigError> {
        let (sample_rate, fft_size, n_mels, capture_duration, capture_interval) = match level {
            1 => (8000, 512, 10, 15, 120),
            2 => (16_000, 512, 12, 20, 90),
            3 => (16_000, 1024, 13, 30, 60),
            4 => (22_050, 1024, 15, 45, 45),
            5 => (44_100, 2048, 20, 60, 30),
            _ => return Err(ConfigError::OutOfRange("quality_level")),
        };
        self.quality_level = level;
        self.sample_rate = sample_rate;
        self.fft_size = fft_size;
        self.n_mels = n_mels;
        self.capture_duration = capture_duration;
        self.capture_interval = capture_interval;
        self.clamp_band_to_nyquist();
        Ok(())
    }

    /// Advances the parameter behind a menu item to its next allowed value.
    ///
    /// Advancing the quality level applies the whole preset row, so the
    /// operator sees the derived parameters change together.
    pub fn advance(&mut self, item: MenuItem) {
        match item {
            MenuItem::SampleRate => {
                self.sample_rate = match self.sample_rate {
                    16_000 => 22_050,
                    22_050 => 44_100,
                    _ => 16_000,
                };
                self.clamp_band_to_nyquist();
            }
            MenuItem::FftSize => {
                self.fft_size = match self.fft_size {
                    512 => 1024,
                    1024 => 2048,
                    _ => 512,
                };
            }
            MenuItem::MelCoefficients => {
                self.n_mels = if self.n_mels >= 20 { 10 } else { self.n_mels + 2 };
            }
            MenuItem::CaptureDuration => {
                self.capture_duration = self.capture_duration % 60 + 15;
            }
            MenuItem::CaptureInterval => {
                self.capture_interval = self.capture_interval % 300 + 30;
            }
            MenuItem::NoiseThreshold => {
                self.noise_threshold += 0.01;
                if self.noise_threshold > 0.1 {
                    self.noise_threshold = 0.001;
                }
            }
            MenuItem::QualityLevel => {
                let next = self.quality_level % 5 + 1;
                // The level is produced by the cycle above, so this cannot fail.
                let _ = self.apply_preset(next);
            }
            MenuItem::Exit => {}
        }
    }

    fn clamp_band_to_nyquist(&mut self) {
        let nyquist = self.sample_rate as f32 / 2.0;
        if self.max_freq > nyquist {
            self.max_freq = nyquist;
        }
        if self.min_freq >= self.max_freq {
            self.min_freq = 0.0;
        }
    }
}

/// One validated single-field mutation of the config.
///
/// Carries the new value for exactly one parameter; applying it builds a
/// candidate config and validates the whole thing, so cross-field
/// invariants hold even for single-field writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamUpdate {
    /// New acquisition sample rate in Hz.
    SampleRate(u32),
    /// New FFT frame length.
    FftSize(u16),
    /// New frame advance in samples.
    HopLength(u16),
    /// New pooled band count.
    MelCoefficients(u16),
    /// New analysis band edges in Hz.
    Band {
        /// Lower edge.
        min: f32,
        /// Upper edge.
        max: f32,
    },
    /// New window length in seconds.
    CaptureDuration(u16),
    /// New idle time between windows in seconds.
    CaptureInterval(u16),
    /// New mean-square noise gate floor.
    NoiseThreshold(f32),
    /// New quality level (the bare field, not the preset row).
    QualityLevel(u8),
}

impl AudioConfig {
    /// Returns a copy with one field changed, if the result validates.
    pub fn with_update(&self, update: ParamUpdate) -> Result<Self, ConfigError> {
        let mut candidate = *self;
        match update {
            ParamUpdate::SampleRate(value) => candidate.sample_rate = value,
            ParamUpdate::FftSize(value) => candidate.fft_size = value,
            ParamUpdate::HopLength(value) => candidate.hop_length = value,
            ParamUpdate::MelCoefficients(value) => candidate.n_mels = value,
            ParamUpdate::Band { min, max } => {
                candidate.min_freq = min;
                candidate.max_freq = max;
            }
            ParamUpdate::CaptureDuration(value) => candidate.capture_duration = value,
            ParamUpdate::CaptureInterval(value) => candidate.capture_interval = value,
            ParamUpdate::NoiseThreshold(value) => candidate.noise_threshold = value,
            ParamUpdate::QualityLevel(value) => candidate.quality_level = value,
        }
        candidate.validate()?;
        Ok(candidate)
    }
}

/// Entries of the cyclic operator config menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    /// Acquisition sample rate.
    SampleRate,
    /// FFT frame length.
    FftSize,
    /// Number of pooled band energies.
    MelCoefficients,
    /// Window length in seconds.
    CaptureDuration,
    /// Idle time between windows in seconds.
    CaptureInterval,
    /// Mean-square noise gate floor.
    NoiseThreshold,
    /// Quality preset level.
    QualityLevel,
    /// Leave the menu and persist the config.
    Exit,
}

impl MenuItem {
    /// Maps a cyclic cursor position onto a menu entry.
    pub fn from_index(index: u8) -> Self {
        match index % MENU_ITEM_COUNT {
            0 => MenuItem::SampleRate,
            1 => MenuItem::FftSize,
            2 => MenuItem::MelCoefficients,
            3 => MenuItem::CaptureDuration,
            4 => MenuItem::CaptureInterval,
            5 => MenuItem::NoiseThreshold,
            6 => MenuItem::QualityLevel,
            _ => MenuItem::Exit,
        }
    }

    /// Short label shown on the menu line of the display.
    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::SampleRate => "Sample Rate",
            MenuItem::FftSize => "FFT Size",
            MenuItem::MelCoefficients => "MFCC Coeffs",
            MenuItem::CaptureDuration => "Capture Len",
            MenuItem::CaptureInterval => "Interval",
            MenuItem::NoiseThreshold => "Noise Floor",
            MenuItem::QualityLevel => "Quality",
            MenuItem::Exit => "Exit Config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        AudioConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_non_power_of_two_fft() {
        let config = AudioConfig {
            fft_size: 1000,
            ..AudioConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::FftNotPowerOfTwo(1000)));
    }

    #[test]
    fn rejects_hop_larger_than_frame() {
        let config = AudioConfig {
            hop_length: 2048,
            fft_size: 1024,
            ..AudioConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::HopExceedsFrame { .. })
        ));
    }

    #[test]
    fn rejects_band_past_nyquist() {
        let config = AudioConfig {
            sample_rate: 8000,
            max_freq: 8000.0,
            ..AudioConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBand { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_scalars() {
        for (mutate, field) in [
            (
                Box::new(|c: &mut AudioConfig| c.sample_rate = 48_000)
                    as Box<dyn Fn(&mut AudioConfig)>,
                "sample_rate",
            ),
            (Box::new(|c: &mut AudioConfig| c.n_mels = 9), "n_mels"),
            (
                Box::new(|c: &mut AudioConfig| c.capture_duration = 90),
                "capture_duration",
            ),
            (
                Box::new(|c: &mut AudioConfig| c.capture_interval = 10),
                "capture_interval",
            ),
            (
                Box::new(|c: &mut AudioConfig| c.noise_threshold = 0.5),
                "noise_threshold",
            ),
            (
                Box::new(|c: &mut AudioConfig| c.quality_level = 6),
                "quality_level",
            ),
        ] {
            let mut config = AudioConfig::default();
            mutate(&mut config);
            assert_eq!(config.validate(), Err(ConfigError::OutOfRange(field)));
        }
    }

    #[test]
    fn sample_rate_cycles_through_allowed_values() {
        let mut config = AudioConfig::default();
        let mut seen = Vec::new();
        for _ in 0..3 {
            config.advance(MenuItem::SampleRate);
            seen.push(config.sample_rate);
        }
        assert_eq!(seen, vec![22_050, 44_100, 16_000]);
    }

    #[test]
    fn sample_rate_step_leaves_preset_one_rate() {
        let mut config = AudioConfig::default();
        config.apply_preset(1).unwrap();
        config.advance(MenuItem::SampleRate);
        assert_eq!(config.sample_rate, 16_000);
    }

    #[test]
    fn mel_count_cycles_and_wraps() {
        let mut config = AudioConfig {
            n_mels: 10,
            ..AudioConfig::default()
        };
        let mut seen = Vec::new();
        for _ in 0..6 {
            config.advance(MenuItem::MelCoefficients);
            seen.push(config.n_mels);
        }
        assert_eq!(seen, vec![12, 14, 16, 18, 20, 10]);
    }

    #[test]
    fn duration_and_interval_wrap() {
        let mut config = AudioConfig {
            capture_duration: 60,
            capture_interval: 300,
            ..AudioConfig::default()
        };
        config.advance(MenuItem::CaptureDuration);
        config.advance(MenuItem::CaptureInterval);
        assert_eq!(config.capture_duration, 15);
        assert_eq!(config.capture_interval, 30);
    }

    #[test]
    fn noise_threshold_wraps_after_ceiling() {
        let mut config = AudioConfig {
            noise_threshold: 0.001,
            ..AudioConfig::default()
        };
        for _ in 0..9 {
            config.advance(MenuItem::NoiseThreshold);
            assert!(config.noise_threshold <= 0.1 + f32::EPSILON);
        }
        config.advance(MenuItem::NoiseThreshold);
        assert!((config.noise_threshold - 0.001).abs() < 1e-6);
    }

    #[test]
    fn quality_step_applies_preset_row() {
        let mut config = AudioConfig::default();
        assert_eq!(config.quality_level, 3);
        config.advance(MenuItem::QualityLevel);
        assert_eq!(config.quality_level, 4);
        assert_eq!(config.sample_rate, 22_050);
        assert_eq!(config.fft_size, 1024);
        assert_eq!(config.n_mels, 15);
        assert_eq!(config.capture_duration, 45);
        assert_eq!(config.capture_interval, 45);
    }

    #[test]
    fn presets_match_table_and_stay_valid() {
        let rows = [
            (1u8, 8000u32, 512u16, 10u16, 15u16, 120u16),
            (2, 16_000, 512, 12, 20, 90),
            (3, 16_000, 1024, 13, 30, 60),
            (4, 22_050, 1024, 15, 45, 45),
            (5, 44_100, 2048, 20, 60, 30),
        ];
        for (level, rate, fft, mels, duration, interval) in rows {
            let mut config = AudioConfig::default();
            config.apply_preset(level).unwrap();
            assert_eq!(config.sample_rate, rate);
            assert_eq!(config.fft_size, fft);
            assert_eq!(config.n_mels, mels);
            assert_eq!(config.capture_duration, duration);
            assert_eq!(config.capture_interval, interval);
            assert_eq!(config.quality_level, level);
            config.validate().unwrap();
        }
    }

    #[test]
    fn preset_reapplication_restores_mutated_fields() {
        let mut config = AudioConfig::default();
        config.apply_preset(3).unwrap();
        config.advance(MenuItem::CaptureDuration);
        assert_eq!(config.capture_duration, 45);
        config.apply_preset(3).unwrap();
        assert_eq!(config.capture_duration, 30);
    }

    #[test]
    fn invalid_preset_level_is_rejected() {
        let mut config = AudioConfig::default();
        assert_eq!(
            config.apply_preset(0),
            Err(ConfigError::OutOfRange("quality_level"))
        );
    }

    #[test]
    fn update_applies_when_in_range() {
        let config = AudioConfig::default();
        let updated = config.with_update(ParamUpdate::CaptureDuration(45)).unwrap();
        assert_eq!(updated.capture_duration, 45);
        // The original is untouched; updates build candidates.
        assert_eq!(config.capture_duration, 30);
    }

    #[test]
    fn update_rejects_cross_field_violations() {
        let config = AudioConfig::default();
        assert!(config.with_update(ParamUpdate::SampleRate(48_000)).is_err());
        assert!(config
            .with_update(ParamUpdate::HopLength(2048))
            .is_err());
        // 8 kHz would put the default 8 kHz band edge past Nyquist.
        assert!(config.with_update(ParamUpdate::SampleRate(8000)).is_err());
    }

    #[test]
    fn menu_cursor_is_cyclic() {
        assert_eq!(MenuItem::from_index(0), MenuItem::SampleRate);
        assert_eq!(MenuItem::from_index(7), MenuItem::Exit);
        assert_eq!(MenuItem::from_index(8), MenuItem::SampleRate);
    }
}
