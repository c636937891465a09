//! Spectral feature extraction: pre-emphasis, framing, windowing, and
//! band-pooled log energies.

use std::f32::consts::PI;

use audimeter_bridge::config::AudioConfig;
use rustfft::{FftPlanner, num_complex::Complex};

/// Floor added before the log so silent bands stay finite.
const LOG_FLOOR: f32 = 1e-10;

/// First-order high-pass `x[i] ← x[i] − α·x[i−1]`, applied in place from
/// the last index down so each step reads the untouched predecessor.
pub fn pre_emphasis(samples: &mut [f32], alpha: f32) {
    for i in (1..samples.len()).rev() {
        samples[i] -= alpha * samples[i - 1];
    }
}

/// Hamming window of the given length.
pub fn hamming_window(length: usize) -> Vec<f32> {
    let n = length as f32;
    (0..length)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f32 / (n - 1.0)).cos())
        .collect()
}

/// Pools the power spectrum of each analysis frame into one log energy.
///
/// Frames advance by `hop_length`; at most `n_mels` frames are analysed
/// and the k-th output is `log(Σ P[bin] + ε)` over the bins that map into
/// `[min_freq, max_freq]` by the linear mapping
/// `bin = freq · fft_size / sample_rate`. Windows too short to fill a
/// frame leave the remaining outputs at zero.
pub fn band_energies(samples: &[f32], config: &AudioConfig) -> Vec<f32> {
    let fft_size = config.fft_size as usize;
    let hop = config.hop_length as usize;
    let n_mels = config.n_mels as usize;

    let mut features = vec![0.0f32; n_mels];
    if samples.len() < fft_size || hop == 0 {
        return features;
    }
    let n_frames = (samples.len() - fft_size) / hop + 1;

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(fft_size);
    let window = hamming_window(fft_size);
    let mut buffer: Vec<Complex<f32>> = vec![Complex { re: 0.0, im: 0.0 }; fft_size];

    let (start_bin, end_bin) = band_bins(config);

    for (frame, feature) in features.iter_mut().enumerate().take(n_frames.min(n_mels)) {
        let offset = frame * hop;
        for (slot, (&sample, &weight)) in buffer
            .iter_mut()
            .zip(samples[offset..offset + fft_size].iter().zip(window.iter()))
        {
            *slot = Complex {
                re: sample * weight,
                im: 0.0,
            };
        }

        fft.process(&mut buffer);

        let mut band_sum = 0.0f32;
        for bin in &buffer[start_bin..end_bin] {
            band_sum += bin.re * bin.re + bin.im * bin.im;
        }
        *feature = (band_sum + LOG_FLOOR).ln();
    }

    features
}

/// Maps the configured frequency band onto FFT bin indices, clamped to
/// the real half of the spectrum.
fn band_bins(config: &AudioConfig) -> (usize, usize) {
    let fft_size = config.fft_size as usize;
    let half = fft_size / 2;
    let to_bin = |freq: f32| (freq * fft_size as f32 / config.sample_rate as f32) as usize;
    let start = to_bin(config.min_freq).min(half);
    let end = to_bin(config.max_freq).min(half);
    (start, end.max(start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn pre_emphasis_matches_hand_computation() {
        let mut samples = vec![1.0, 2.0, 3.0];
        pre_emphasis(&mut samples, 0.5);
        assert_eq!(samples, vec![1.0, 1.5, 2.0]);
    }

    #[test]
    fn pre_emphasis_leaves_first_sample() {
        let mut samples = vec![0.7, 0.7, 0.7];
        pre_emphasis(&mut samples, 0.97);
        assert_eq!(samples[0], 0.7);
        assert!((samples[1] - 0.7 * 0.03).abs() < 1e-6);
    }

    #[test]
    fn hamming_window_shape() {
        let window = hamming_window(512);
        assert!((window[0] - 0.08).abs() < 1e-6);
        assert!((window[511] - 0.08).abs() < 1e-6);
        // Peak sits at the centre and reaches 0.54 + 0.46.
        assert!(window[255] > 0.999);
        assert!(window.iter().all(|&w| w > 0.0 && w <= 1.0));
    }

    #[test]
    fn feature_vector_has_n_mels_entries() {
        let config = AudioConfig::default();
        let samples = vec![0.1f32; config.sample_rate as usize];
        let features = band_energies(&samples, &config);
        assert_eq!(features.len(), config.n_mels as usize);
    }

    #[test]
    fn short_input_leaves_features_zeroed() {
        let config = AudioConfig::default();
        let samples = vec![0.1f32; config.fft_size as usize - 1];
        let features = band_energies(&samples, &config);
        assert!(features.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn in_band_tone_outscores_silence() {
        let config = AudioConfig::default();
        let rate = config.sample_rate as f32;
        let tone: Vec<f32> = (0..config.sample_rate as usize)
            .map(|i| 0.5 * (TAU * 1000.0 * i as f32 / rate).sin())
            .collect();
        let silence = vec![0.0f32; config.sample_rate as usize];

        let tone_features = band_energies(&tone, &config);
        let silence_features = band_energies(&silence, &config);
        assert!(tone_features[0] > silence_features[0]);
        // A silent band bottoms out at the log floor.
        assert!((silence_features[0] - 1e-10f32.ln()).abs() < 1.0);
    }

    #[test]
    fn band_bins_follow_linear_mapping_and_clamp() {
        let config = AudioConfig::default();
        let (start, end) = band_bins(&config);
        assert_eq!(start, (300.0 * 1024.0 / 16_000.0) as usize);
        assert_eq!(end, 512); // 8 kHz is the Nyquist bin at 16 kHz.

        let narrow = AudioConfig {
            min_freq: 1000.0,
            max_freq: 2000.0,
            ..config
        };
        let (start, end) = band_bins(&narrow);
        assert_eq!((start, end), (64, 128));
    }
}
