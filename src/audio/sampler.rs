//! Per-stem signal sampling.
//!
//! The playback callback pushes each stem's post-gain samples into a
//! [`TrackTap`]; once per frame a [`SignalSampler`] reads the newest window
//! back out as 8-bit amplitudes, the domain the motion model is defined
//! over (128 = silence, 0/255 = full negative/positive swing).

use std::sync::{Arc, Mutex};

use crate::params::SamplerConfig;

use super::AudioError;

/// Capacity-bounded shared buffer of one stem's most recent samples.
///
/// Cloning shares the underlying buffer; the writer (audio callback) and
/// readers (samplers) each hold a clone. Old samples are dropped from the
/// front so a stalled reader never grows the buffer.
#[derive(Clone)]
pub struct TrackTap {
    inner: Arc<Mutex<TapInner>>,
}

struct TapInner {
    samples: Vec<f32>,
    capacity: usize,
}

impl TrackTap {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TapInner {
                samples: Vec::with_capacity(capacity),
                capacity,
            })),
        }
    }

    /// Append a block of samples, discarding the oldest past capacity.
    pub fn push(&self, block: &[f32]) {
        let mut inner = self.inner.lock().unwrap();
        inner.samples.extend_from_slice(block);
        let overflow = inner.samples.len().saturating_sub(inner.capacity);
        if overflow > 0 {
            inner.samples.drain(0..overflow);
        }
    }

    /// The newest `len` samples, or None while fewer have arrived.
    pub fn latest(&self, len: usize) -> Option<Vec<f32>> {
        let inner = self.inner.lock().unwrap();
        if inner.samples.len() < len {
            return None;
        }
        let start = inner.samples.len() - len;
        Some(inner.samples[start..].to_vec())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One frame's view of a stem's signal.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Byte-domain amplitude samples, one per bar.
    pub amplitudes: Vec<u8>,

    /// Arithmetic mean of `amplitudes` normalized by 128; a silent,
    /// centered signal yields ≈ 1.0.
    pub mean: f32,
}

impl Snapshot {
    /// One bin's amplitude recentered into [-1, 1].
    pub fn centered(&self, index: usize) -> f32 {
        self.amplitudes[index] as f32 / 128.0 - 1.0
    }

    /// The track-wide mean recentered for the loudness power computation.
    /// The mean lives in a different domain than isolated samples, hence
    /// the shift by 2 rather than 1.
    pub fn centered_mean(&self) -> f32 {
        self.mean / 128.0 - 2.0
    }
}

/// On-demand sampler over one stem's tap.
pub struct SignalSampler {
    tap: Option<TrackTap>,
    resolution: usize,
}

impl SignalSampler {
    /// Attach a sampler to `tap`. Fails if the configured resolution is not
    /// a positive power of two or exceeds the tap capacity.
    pub fn new(tap: TrackTap, config: &SamplerConfig) -> Result<Self, AudioError> {
        config.validate()?;
        Ok(Self {
            tap: Some(tap),
            resolution: config.resolution,
        })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// The most recent snapshot, or None while the stem has not produced a
    /// full window (or the sampler was detached).
    pub fn sample(&self) -> Option<Snapshot> {
        let tap = self.tap.as_ref()?;
        let window = tap.latest(self.resolution)?;
        let amplitudes: Vec<u8> = window.iter().map(|&s| quantize(s)).collect();
        let sum: u32 = amplitudes.iter().map(|&a| u32::from(a)).sum();
        let mean = sum as f32 / (128.0 * amplitudes.len() as f32);
        Some(Snapshot { amplitudes, mean })
    }

    /// The newest `len` raw samples, for the spectral analyzer.
    pub fn raw_window(&self, len: usize) -> Option<Vec<f32>> {
        self.tap.as_ref()?.latest(len)
    }

    /// Disconnect from the tap. Idempotent; a detached sampler reports
    /// not-ready forever.
    pub fn detach(&mut self) {
        self.tap = None;
    }

    pub fn is_attached(&self) -> bool {
        self.tap.is_some()
    }
}

/// Map a [-1, 1] sample into the unsigned byte domain, saturating outside.
fn quantize(sample: f32) -> u8 {
    (sample * 128.0 + 128.0).clamp(0.0, 255.0) as u8
}
