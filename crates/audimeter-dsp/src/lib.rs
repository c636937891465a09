//! Acoustic fingerprinting of captured audio windows.
//!
//! One window of normalised mono samples is condensed into a fixed-size
//! feature payload, a content hash, and a confidence score:
//!
//! ```text
//! noise gate → pre-emphasis → framing → Hamming → FFT power spectrum
//!            → band pooling → base64 payload → MD5 hash → confidence
//! ```
//!
//! The transform is deterministic: the same samples under the same config
//! always produce byte-identical payloads and hashes. The mel stage is a
//! simplified one-value-per-frame pooling over the configured band; it is
//! not a full cepstral transform, and the server-side catalogue is built
//! against this exact variant.

pub mod encoding;
pub mod features;

use audimeter_bridge::config::AudioConfig;
use serde::Serialize;

/// Pre-emphasis coefficient of the first-order high-pass filter.
pub const PRE_EMPHASIS_ALPHA: f32 = 0.97;

/// Minimum confidence a fingerprint needs before it is handed to transport.
pub const PUBLISH_THRESHOLD: f32 = 0.1;

/// Gain applied to the raw energy-variance product of the confidence score.
const CONFIDENCE_GAIN: f32 = 10.0;

/// The artifact transmitted to the aggregation server.
///
/// Serialises directly into the wire object of the ingest API; the device
/// identifier is added by the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fingerprint {
    /// 128-bit content digest as 32 lowercase hex characters.
    pub hash: String,
    /// Acquisition start in microseconds since the Unix epoch.
    pub timestamp: u64,
    /// Match-worthiness estimate in `[0.0, 1.0]`.
    pub confidence: f32,
    /// Window length in seconds.
    pub duration: u16,
    /// Base64 of the raw feature-vector bytes.
    pub features: String,
    /// Sample rate the window was acquired at, in Hz.
    pub sample_rate: u32,
    /// Quality preset the window was acquired under.
    pub quality_level: u8,
}

impl Fingerprint {
    /// Whether this fingerprint clears the publish threshold.
    pub fn is_publishable(&self) -> bool {
        self.confidence > PUBLISH_THRESHOLD
    }

    /// Builds the below-threshold variant that is logged and dropped.
    ///
    /// It still carries a well-formed hash (the digest of its empty
    /// payload) so every fingerprint satisfies the same shape invariants.
    fn rejected(config: &AudioConfig, timestamp: u64) -> Self {
        Self {
            hash: encoding::content_hash(""),
            timestamp,
            confidence: 0.0,
            duration: config.capture_duration,
            features: String::new(),
            sample_rate: config.sample_rate,
            quality_level: config.quality_level,
        }
    }
}

/// Mean-square energy of a window, the quantity the noise gate compares
/// against `noise_threshold`.
pub fn mean_square_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    sum / samples.len() as f32
}

/// Scores a feature vector by how much structure it carries.
///
/// Both a flat spectrum (low variance) and a silent one (low energy) are
/// poor matching material, so the score is the product of the two,
/// amplified and clamped to 1.0. Any numerical anomaly collapses to 0.0
/// and the fingerprint is treated as noise.
pub fn confidence_score(features: &[f32]) -> f32 {
    if features.is_empty() {
        return 0.0;
    }
    let n = features.len() as f32;
    let mut energy = 0.0f32;
    let mut mean = 0.0f32;
    for value in features {
        energy += value * value;
        mean += value;
    }
    mean /= n;
    let mut variance = 0.0f32;
    for value in features {
        let diff = value - mean;
        variance += diff * diff;
    }
    variance /= n;

    let confidence = (energy.sqrt() * variance.sqrt() * CONFIDENCE_GAIN).min(1.0);
    if confidence.is_finite() { confidence } else { 0.0 }
}

/// Runs the full fingerprinting pipeline over one captured window.
///
/// `samples` is consumed in place (pre-emphasis mutates it); `timestamp`
/// is the acquisition start of the window. A window gated out as noise
/// comes back with confidence 0.0, which keeps it below the publish
/// threshold.
pub fn generate(samples: &mut [f32], config: &AudioConfig, timestamp: u64) -> Fingerprint {
    let energy = mean_square_energy(samples);
    if energy < config.noise_threshold {
        log::warn!("window discarded by noise gate, mean-square energy {energy:.6}");
        return Fingerprint::rejected(config, timestamp);
    }

    features::pre_emphasis(samples, PRE_EMPHASIS_ALPHA);
    let feature_vector = features::band_energies(samples, config);

    let payload = encoding::encode_payload(&feature_vector);
    let hash = encoding::content_hash(&payload);
    let confidence = confidence_score(&feature_vector);

    log::info!(
        "fingerprint ready, hash {}.., confidence {confidence:.2}",
        &hash[..8]
    );

    Fingerprint {
        hash,
        timestamp,
        confidence,
        duration: config.capture_duration,
        features: payload,
        sample_rate: config.sample_rate,
        quality_level: config.quality_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn test_config() -> AudioConfig {
        AudioConfig {
            sample_rate: 16_000,
            capture_duration: 1,
            ..AudioConfig::default()
        }
    }

    /// One second of an amplitude-modulated tone, rich enough that the
    /// pooled band energies vary from frame to frame.
    fn modulated_tone(rate: u32) -> Vec<f32> {
        (0..rate as usize)
            .map(|i| {
                let t = i as f32 / rate as f32;
                let envelope = 0.2 + 0.8 * (TAU * 3.0 * t).sin().abs();
                0.5 * (TAU * 997.0 * t).sin() * envelope
            })
            .collect()
    }

    #[test]
    fn silence_yields_zero_confidence() {
        let config = test_config();
        let mut samples = vec![0.0f32; config.samples_per_window()];
        let fingerprint = generate(&mut samples, &config, 42);
        assert_eq!(fingerprint.confidence, 0.0);
        assert!(!fingerprint.is_publishable());
        assert!(fingerprint.features.is_empty());
        assert_eq!(fingerprint.timestamp, 42);
    }

    #[test]
    fn every_fingerprint_hash_is_32_lowercase_hex() {
        let config = test_config();
        for samples in [
            vec![0.0f32; config.samples_per_window()],
            modulated_tone(config.sample_rate),
        ] {
            let mut samples = samples;
            let fingerprint = generate(&mut samples, &config, 0);
            assert_eq!(fingerprint.hash.len(), 32);
            assert!(fingerprint.hash.chars().all(|c| c.is_ascii_hexdigit()
                && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn pipeline_is_deterministic() {
        let config = test_config();
        let samples = modulated_tone(config.sample_rate);

        let mut first = samples.clone();
        let mut second = samples;
        let a = generate(&mut first, &config, 7);
        let b = generate(&mut second, &config, 7);

        assert_eq!(a.features, b.features);
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.confidence, b.confidence);
    }

    #[test]
    fn broadcast_style_audio_clears_publish_threshold() {
        let config = test_config();
        let mut samples = modulated_tone(config.sample_rate);
        let fingerprint = generate(&mut samples, &config, 0);
        assert!(fingerprint.confidence > PUBLISH_THRESHOLD);
        assert!(fingerprint.confidence <= 1.0);
        assert!(!fingerprint.features.is_empty());
    }

    #[test]
    fn window_shorter_than_one_frame_scores_zero() {
        let config = test_config();
        let mut samples = vec![0.5f32; config.fft_size as usize / 2];
        let fingerprint = generate(&mut samples, &config, 0);
        assert_eq!(fingerprint.confidence, 0.0);
    }

    #[test]
    fn confidence_collapses_on_numerical_anomalies() {
        assert_eq!(confidence_score(&[f32::NAN, 1.0, 2.0]), 0.0);
        assert_eq!(confidence_score(&[f32::INFINITY, 1.0, 2.0]), 0.0);
        assert_eq!(confidence_score(&[]), 0.0);
    }

    #[test]
    fn confidence_is_clamped_to_one() {
        let features: Vec<f32> = (0..13).map(|i| (i as f32) * 3.0).collect();
        assert_eq!(confidence_score(&features), 1.0);
    }

    #[test]
    fn mean_square_energy_of_constant_signal() {
        let samples = vec![0.5f32; 1000];
        assert!((mean_square_energy(&samples) - 0.25).abs() < 1e-6);
        assert_eq!(mean_square_energy(&[]), 0.0);
    }
}
