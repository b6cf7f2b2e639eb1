//! Signal analysis configuration.

use std::ops::Range;

use crate::audio::AudioError;

/// Per-stem amplitude sampling configuration.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Samples per snapshot, one per bar. Must be a positive power of two.
    pub resolution: usize,

    /// Ring capacity of each stem's tap, in samples. Must cover the largest
    /// analysis window (the sampler resolution and the spectrum FFT size).
    pub tap_capacity: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            resolution: 128,
            tap_capacity: 4096,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<(), AudioError> {
        if self.resolution == 0 || !self.resolution.is_power_of_two() {
            return Err(AudioError::InvalidResolution(self.resolution));
        }
        if self.tap_capacity < self.resolution {
            return Err(AudioError::InvalidResolution(self.tap_capacity));
        }
        Ok(())
    }
}

/// Frequency-band analysis configuration.
#[derive(Debug, Clone)]
pub struct SpectrumConfig {
    /// Audio sample rate (Hz). Overwritten with the device rate at startup.
    pub sample_rate_hz: usize,

    /// FFT window size (samples). Must be a power of two.
    pub fft_size: usize,

    /// Low band edges (Hz): bass energy, drives the backdrop pulse.
    pub low_range_hz: (f32, f32),

    /// Mid band edges (Hz).
    pub mid_range_hz: (f32, f32),

    /// High band edges (Hz).
    pub high_range_hz: (f32, f32),
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            fft_size: 1024,
            low_range_hz: (20.0, 200.0),
            mid_range_hz: (200.0, 1000.0),
            high_range_hz: (1000.0, 4000.0),
        }
    }
}

impl SpectrumConfig {
    /// Convert a frequency (Hz) to an FFT bin index.
    pub fn hz_to_bin(&self, hz: f32) -> usize {
        ((hz * self.fft_size as f32) / self.sample_rate_hz as f32) as usize
    }

    pub fn low_bins(&self) -> Range<usize> {
        self.hz_to_bin(self.low_range_hz.0)..self.hz_to_bin(self.low_range_hz.1)
    }

    pub fn mid_bins(&self) -> Range<usize> {
        self.hz_to_bin(self.mid_range_hz.0)..self.hz_to_bin(self.mid_range_hz.1)
    }

    pub fn high_bins(&self) -> Range<usize> {
        self.hz_to_bin(self.high_range_hz.0)..self.hz_to_bin(self.high_range_hz.1)
    }

    pub fn validate(&self) -> Result<(), AudioError> {
        if self.fft_size == 0 || !self.fft_size.is_power_of_two() {
            return Err(AudioError::InvalidResolution(self.fft_size));
        }
        Ok(())
    }
}
