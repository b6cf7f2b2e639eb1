//! Stem playback and per-track signal analysis.

mod engine;
mod sampler;
mod spectrum;

pub use engine::{AudioEngine, Stem};
pub use sampler::{SignalSampler, Snapshot, TrackTap};
pub use spectrum::{BandLevels, SpectrumAnalyzer};

use thiserror::Error;

/// Failures at the audio boundary. Setup-time only: once the engine and
/// samplers exist, the per-frame path has no fallible operations.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("failed to query default output config: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("invalid analysis window {0}: must be a positive power of two and fit the tap")]
    InvalidResolution(usize),
}
