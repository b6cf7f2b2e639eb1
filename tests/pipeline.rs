//! End-to-end pipeline tests.
//!
//! Mixer commands flow through a simulated playback engine into the
//! per-track taps, and the stage animates from exactly what the listener
//! would hear. No audio device or window is needed.

use std::f32::consts::PI;
use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;

use stemstage::audio::{SignalSampler, TrackTap};
use stemstage::mixer::{AudioBackend, Mixer, TrackId, DEFAULT_VOLUME, TRACK_COUNT};
use stemstage::params::{MotionParams, SamplerConfig, StageParams};
use stemstage::stage::StageSystem;

struct SimShared {
    gains: [f32; TRACK_COUNT],
    playing: bool,
    playhead: usize,
}

/// Playback engine stand-in: applies per-track gains and feeds the taps
/// the way the real output callback does. Clones share state, mirroring
/// the real engine's shared handle.
#[derive(Clone)]
struct SimulatedEngine {
    shared: Arc<Mutex<SimShared>>,
    taps: Vec<TrackTap>,
}

impl SimulatedEngine {
    fn new(config: &SamplerConfig) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SimShared {
                gains: [0.0; TRACK_COUNT],
                playing: false,
                playhead: 0,
            })),
            taps: (0..TRACK_COUNT)
                .map(|_| TrackTap::new(config.tap_capacity))
                .collect(),
        }
    }

    fn tap(&self, index: usize) -> TrackTap {
        self.taps[index].clone()
    }

    /// Advance `frames` samples of a synthetic session where every stem
    /// carries a full-scale sine at its own frequency. Paused transport
    /// feeds silence, like the real callback.
    fn pump(&self, frames: usize) {
        let mut shared = self.shared.lock().unwrap();
        let mut blocks: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); TRACK_COUNT];
        for _ in 0..frames {
            for (track, block) in blocks.iter_mut().enumerate() {
                let sample = if shared.playing {
                    let freq = 55.0 * (track + 1) as f32;
                    (2.0 * PI * freq * shared.playhead as f32 / 44100.0).sin()
                } else {
                    0.0
                };
                block.push(sample * shared.gains[track]);
            }
            shared.playhead += 1;
        }
        for (track, tap) in self.taps.iter().enumerate() {
            tap.push(&blocks[track]);
        }
    }
}

impl AudioBackend for SimulatedEngine {
    fn is_playing(&self) -> bool {
        self.shared.lock().unwrap().playing
    }
    fn volume(&self, index: usize) -> f32 {
        self.shared.lock().unwrap().gains[index]
    }
    fn set_volume(&mut self, index: usize, volume: f32) {
        self.shared.lock().unwrap().gains[index] = volume;
    }
    fn play(&mut self) {
        self.shared.lock().unwrap().playing = true;
    }
    fn pause(&mut self) {
        self.shared.lock().unwrap().playing = false;
    }
}

fn config() -> SamplerConfig {
    SamplerConfig {
        resolution: 32,
        tap_capacity: 4096,
    }
}

fn stage(config: &SamplerConfig) -> StageSystem {
    StageSystem::new(&StageParams::default(), config, MotionParams::default())
}

fn attach(system: &mut StageSystem, engine: &SimulatedEngine, id: TrackId, config: &SamplerConfig) {
    let sampler = SignalSampler::new(engine.tap(id.index()), config).unwrap();
    system.attach(id, sampler, None);
}

#[test]
fn volume_command_reaches_only_the_target_track() {
    let config = config();
    let engine = SimulatedEngine::new(&config);
    let mut mixer = Mixer::new(engine.clone());

    mixer.set_volume(TrackId::Bass, 0.2);

    assert_eq!(mixer.track(TrackId::Bass).volume, 0.2);
    assert_eq!(engine.volume(TrackId::Bass.index()), 0.2);
    for id in [TrackId::Vocal, TrackId::Drum, TrackId::Guitar, TrackId::Piano] {
        assert_eq!(mixer.track(id).volume, DEFAULT_VOLUME);
        assert_eq!(engine.volume(id.index()), DEFAULT_VOLUME);
    }
}

#[test]
fn muted_track_plays_but_analyzes_silence() {
    let config = config();
    let engine = SimulatedEngine::new(&config);
    let mut system = stage(&config);
    attach(&mut system, &engine, TrackId::Vocal, &config);
    attach(&mut system, &engine, TrackId::Drum, &config);

    let mut mixer = Mixer::new(engine.clone());
    mixer.mute(TrackId::Drum);
    mixer.play_all();

    // the transport runs for the muted track too
    assert!(engine.is_playing());
    assert_eq!(engine.volume(TrackId::Drum.index()), 0.0);

    for _ in 0..20 {
        engine.pump(256);
        system.update();
    }

    // vocal's signal raised bars; drum analyzed post-gain silence
    assert!(system
        .track(TrackId::Vocal)
        .bars()
        .iter()
        .any(|b| b.height() > 0.0));
    for bar in system.track(TrackId::Drum).bars() {
        assert_relative_eq!(bar.height(), 0.0);
    }
    // but the muted track is still live and renders
    assert!(system.track(TrackId::Drum).is_live());
}

#[test]
fn unmute_restores_the_commanded_volume_to_the_engine() {
    let config = config();
    let engine = SimulatedEngine::new(&config);
    let mut mixer = Mixer::new(engine.clone());

    mixer.set_volume(TrackId::Guitar, 0.7);
    mixer.mute(TrackId::Guitar);
    assert_eq!(engine.volume(TrackId::Guitar.index()), 0.0);

    mixer.unmute(TrackId::Guitar);
    assert_eq!(engine.volume(TrackId::Guitar.index()), 0.7);
}

#[test]
fn solo_silences_the_band_but_not_the_soloed_stem() {
    let config = config();
    let engine = SimulatedEngine::new(&config);
    let mut system = stage(&config);
    for id in TrackId::ALL {
        attach(&mut system, &engine, id, &config);
    }

    let mut mixer = Mixer::new(engine.clone());
    mixer.play_all();
    mixer.solo(TrackId::Piano);

    for _ in 0..20 {
        engine.pump(256);
        system.update();
    }

    assert!(system
        .track(TrackId::Piano)
        .bars()
        .iter()
        .any(|b| b.height() > 0.0));
    for id in [TrackId::Vocal, TrackId::Drum, TrackId::Guitar, TrackId::Bass] {
        for bar in system.track(id).bars() {
            assert_relative_eq!(bar.height(), 0.0);
        }
    }

    // soloing another stem does not restore the first
    mixer.solo(TrackId::Vocal);
    assert!(mixer.track(TrackId::Piano).muted);
    assert_eq!(engine.volume(TrackId::Piano.index()), 0.0);
    assert_eq!(engine.volume(TrackId::Vocal.index()), DEFAULT_VOLUME);
}

#[test]
fn pausing_feeds_silence_and_bars_decay() {
    let config = config();
    let engine = SimulatedEngine::new(&config);
    let mut system = stage(&config);
    attach(&mut system, &engine, TrackId::Bass, &config);

    let mut mixer = Mixer::new(engine.clone());
    mixer.play_all();
    for _ in 0..20 {
        engine.pump(256);
        system.update();
    }
    let peak: f32 = system
        .track(TrackId::Bass)
        .bars()
        .iter()
        .map(|b| b.height())
        .fold(0.0, f32::max);
    assert!(peak > 0.0);

    mixer.pause_all();
    for _ in 0..20 {
        engine.pump(256);
        system.update();
    }
    let after: f32 = system
        .track(TrackId::Bass)
        .bars()
        .iter()
        .map(|b| b.height())
        .fold(0.0, f32::max);
    // exponential falloff: twenty silent frames shrink heights to nothing
    assert!(after < peak * 0.01);
}

#[test]
fn mid_scale_window_produces_no_ring_offset() {
    // the all-64 reference window: mean 0.5, centered mean ≈ -1.996,
    // power floors to zero, ring offset zero
    let config = config();
    let engine = SimulatedEngine::new(&config);
    let mut system = stage(&config);
    attach(&mut system, &engine, TrackId::Vocal, &config);

    engine.tap(TrackId::Vocal.index()).push(&[-0.5; 64]);

    let params = MotionParams::default();
    let placement = StageParams::default().placement(TrackId::Vocal);
    let before = system.track(TrackId::Vocal).bars()[0].position();
    system.update();
    let after = system.track(TrackId::Vocal).bars()[0].position();

    // invert one lerp step to recover the frame's target
    let target_x = before.x + (after.x - before.x) / params.lerp_rate_xz;
    let target_z = before.z + (after.z - before.z) / params.lerp_rate_xz;
    let dx = target_x - placement.center.x;
    let dz = target_z - placement.center.z;
    assert_relative_eq!((dx * dx + dz * dz).sqrt(), placement.radius_m, epsilon = 1e-3);
}

#[test]
fn mute_all_then_unmute_all_round_trips_through_the_engine() {
    let config = config();
    let engine = SimulatedEngine::new(&config);
    let mut mixer = Mixer::new(engine.clone());

    mixer.set_volume(TrackId::Drum, 0.9);
    mixer.mute_all_or_unmute_all();
    for id in TrackId::ALL {
        assert_eq!(engine.volume(id.index()), 0.0);
    }

    mixer.mute_all_or_unmute_all();
    assert_eq!(engine.volume(TrackId::Drum.index()), 0.9);
    assert_eq!(engine.volume(TrackId::Vocal.index()), DEFAULT_VOLUME);
}
