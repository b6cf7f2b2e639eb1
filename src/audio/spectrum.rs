//! Frequency-band analysis of a stem's recent signal.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::params::SpectrumConfig;

use super::AudioError;

/// Band energies for one stem (mean FFT magnitude per band).
#[derive(Clone, Copy, Debug, Default)]
pub struct BandLevels {
    /// Bass (default 20-200 Hz)
    pub low: f32,
    /// Mids (default 200-1000 Hz)
    pub mid: f32,
    /// Highs (default 1000-4000 Hz)
    pub high: f32,
}

/// Hann-windowed FFT over the newest window of a stem's signal.
///
/// Pure with respect to its input: the same window always yields the same
/// levels. The FFT plan and scratch buffer are reused across frames.
pub struct SpectrumAnalyzer {
    config: SpectrumConfig,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new(config: SpectrumConfig) -> Result<Self, AudioError> {
        config.validate()?;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); config.fft_size];
        Ok(Self {
            config,
            fft,
            scratch,
        })
    }

    pub fn config(&self) -> &SpectrumConfig {
        &self.config
    }

    /// Analyze the newest `fft_size` samples of `samples`. Returns None
    /// while the window is shorter than the FFT size.
    pub fn analyze(&mut self, samples: &[f32]) -> Option<BandLevels> {
        let size = self.config.fft_size;
        if samples.len() < size {
            return None;
        }
        let window = &samples[samples.len() - size..];

        for (i, &sample) in window.iter().enumerate() {
            self.scratch[i] = Complex::new(sample * hann_window(i, size), 0.0);
        }
        self.fft.process(&mut self.scratch);

        let band = |bins: std::ops::Range<usize>| -> f32 {
            if bins.is_empty() {
                return 0.0;
            }
            let len = bins.len() as f32;
            self.scratch[bins].iter().map(|c| c.norm()).sum::<f32>() / len
        };

        Some(BandLevels {
            low: band(self.config.low_bins()),
            mid: band(self.config.mid_bins()),
            high: band(self.config.high_bins()),
        })
    }
}

/// Hann window coefficient for one sample of an analysis window.
fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_hz: f32, sample_rate_hz: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq_hz * i as f32 / sample_rate_hz).sin())
            .collect()
    }

    #[test]
    fn hann_window_is_zero_at_edges_and_one_at_center() {
        let size = 1024;
        assert!(hann_window(0, size).abs() < 0.01);
        assert!(hann_window(size - 1, size).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn analyze_is_none_for_short_window() {
        let mut analyzer = SpectrumAnalyzer::new(SpectrumConfig::default()).unwrap();
        assert!(analyzer.analyze(&[0.0; 512]).is_none());
    }

    #[test]
    fn bass_sine_concentrates_in_low_band() {
        let config = SpectrumConfig::default();
        let rate = config.sample_rate_hz as f32;
        let mut analyzer = SpectrumAnalyzer::new(config).unwrap();

        let samples = sine(100.0, rate, 1024);
        let levels = analyzer.analyze(&samples).unwrap();
        assert!(levels.low > levels.mid);
        assert!(levels.low > levels.high);
    }

    #[test]
    fn mid_sine_concentrates_in_mid_band() {
        let config = SpectrumConfig::default();
        let rate = config.sample_rate_hz as f32;
        let mut analyzer = SpectrumAnalyzer::new(config).unwrap();

        let samples = sine(600.0, rate, 1024);
        let levels = analyzer.analyze(&samples).unwrap();
        assert!(levels.mid > levels.low);
        assert!(levels.mid > levels.high);
    }

    #[test]
    fn silence_yields_zero_bands() {
        let mut analyzer = SpectrumAnalyzer::new(SpectrumConfig::default()).unwrap();
        let levels = analyzer.analyze(&[0.0; 1024]).unwrap();
        assert_eq!(levels.low, 0.0);
        assert_eq!(levels.mid, 0.0);
        assert_eq!(levels.high, 0.0);
    }

    #[test]
    fn rejects_non_power_of_two_fft() {
        let config = SpectrumConfig {
            fft_size: 1000,
            ..SpectrumConfig::default()
        };
        assert!(SpectrumAnalyzer::new(config).is_err());
    }
}
