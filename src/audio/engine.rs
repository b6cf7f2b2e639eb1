//! Stem playback engine.
//!
//! Owns the cpal output stream that mixes the five stems. The callback
//! applies each stem's gain, sums into the device buffer, and feeds every
//! stem's post-gain block into its tap so the visualization sees exactly
//! what the listener hears (a muted stem analyzes as silence).

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{info, warn};

use crate::mixer::{AudioBackend, TRACK_COUNT};
use crate::params::SamplerConfig;

use super::sampler::TrackTap;
use super::AudioError;

/// One decoded stem: mono samples in [-1, 1].
pub struct Stem {
    pub samples: Vec<f32>,
    pub sample_rate_hz: u32,
}

/// State shared between the control thread and the output callback.
struct EngineShared {
    stems: [Option<Stem>; TRACK_COUNT],
    gains: [f32; TRACK_COUNT],
    playing: bool,
    playhead: usize,
    /// Length of the longest stem; the playhead wraps here.
    span: usize,
}

/// Playback engine over the default output device.
///
/// The stream stays alive for the engine's lifetime; dropping the engine
/// tears the stream down and stops all per-frame tap traffic.
pub struct AudioEngine {
    shared: Arc<Mutex<EngineShared>>,
    taps: [TrackTap; TRACK_COUNT],
    sample_rate_hz: u32,
    _stream: cpal::Stream,
}

impl AudioEngine {
    /// Build the output stream over `stems` (one slot per track, in
    /// [`crate::mixer::TrackId`] order; None marks an unloaded track).
    pub fn new(
        stems: [Option<Stem>; TRACK_COUNT],
        config: &SamplerConfig,
    ) -> Result<Self, AudioError> {
        config.validate()?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;
        let stream_config = device.default_output_config()?;
        let sample_rate_hz = stream_config.sample_rate().0;
        let channels = stream_config.channels() as usize;

        info!(
            "audio: {} @ {}Hz, {} channels",
            device.name().unwrap_or_else(|_| "unknown device".into()),
            sample_rate_hz,
            channels
        );
        for (index, stem) in stems.iter().enumerate() {
            if let Some(stem) = stem {
                if stem.sample_rate_hz != sample_rate_hz {
                    warn!(
                        "audio: stem {} is {}Hz, device is {}Hz; playing as-is",
                        index, stem.sample_rate_hz, sample_rate_hz
                    );
                }
            }
        }

        let span = stems
            .iter()
            .flatten()
            .map(|s| s.samples.len())
            .max()
            .unwrap_or(0);

        let shared = Arc::new(Mutex::new(EngineShared {
            stems,
            gains: [0.0; TRACK_COUNT],
            playing: false,
            playhead: 0,
            span,
        }));

        let taps: [TrackTap; TRACK_COUNT] =
            std::array::from_fn(|_| TrackTap::new(config.tap_capacity));

        let shared_cb = Arc::clone(&shared);
        let taps_cb = taps.clone();
        // Per-track scratch blocks, reused across callbacks so the audio
        // thread never allocates once warmed up.
        let mut blocks: [Vec<f32>; TRACK_COUNT] = std::array::from_fn(|_| Vec::new());

        let stream = device.build_output_stream(
            &stream_config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels;
                for block in &mut blocks {
                    block.clear();
                }

                {
                    let mut shared = shared_cb.lock().unwrap();
                    for frame in 0..frames {
                        let mut mix = 0.0f32;
                        if shared.playing && shared.span > 0 {
                            let playhead = shared.playhead;
                            for (track, stem) in shared.stems.iter().enumerate() {
                                let sample = stem
                                    .as_ref()
                                    .and_then(|s| s.samples.get(playhead))
                                    .copied()
                                    .unwrap_or(0.0);
                                let post = sample * shared.gains[track];
                                blocks[track].push(post);
                                mix += post;
                            }
                            shared.playhead += 1;
                            if shared.playhead >= shared.span {
                                shared.playhead = 0;
                            }
                        } else {
                            for block in &mut blocks {
                                block.push(0.0);
                            }
                        }

                        // Safety limiter: five stems at full gain can sum
                        // past full scale.
                        let out = mix.clamp(-1.0, 1.0);
                        for channel in 0..channels {
                            data[frame * channels + channel] = out;
                        }
                    }
                }

                for (track, tap) in taps_cb.iter().enumerate() {
                    tap.push(&blocks[track]);
                }
            },
            |err| warn!("audio stream error: {}", err),
            None,
        )?;

        stream.play()?;

        Ok(Self {
            shared,
            taps,
            sample_rate_hz,
            _stream: stream,
        })
    }

    /// Tap handle for one track, for attaching a [`super::SignalSampler`].
    pub fn tap(&self, index: usize) -> TrackTap {
        debug_assert!(index < TRACK_COUNT, "track index {index} out of range");
        self.taps[index].clone()
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Whether a stem was actually loaded into the given slot.
    pub fn has_stem(&self, index: usize) -> bool {
        debug_assert!(index < TRACK_COUNT, "track index {index} out of range");
        self.shared.lock().unwrap().stems[index].is_some()
    }
}

impl AudioBackend for AudioEngine {
    fn is_playing(&self) -> bool {
        self.shared.lock().unwrap().playing
    }

    fn volume(&self, index: usize) -> f32 {
        debug_assert!(index < TRACK_COUNT, "track index {index} out of range");
        self.shared.lock().unwrap().gains[index]
    }

    fn set_volume(&mut self, index: usize, volume: f32) {
        debug_assert!(index < TRACK_COUNT, "track index {index} out of range");
        self.shared.lock().unwrap().gains[index] = volume;
    }

    fn play(&mut self) {
        self.shared.lock().unwrap().playing = true;
    }

    fn pause(&mut self) {
        self.shared.lock().unwrap().playing = false;
    }
}
