//! Stemstage - an audio-reactive stage for multitrack stems
//!
//! Five stems play through one mixer; each stem's live signal drives a
//! ring of bars orbiting its spot on the stage. The keyboard is the mixer
//! surface: space toggles the transport, 1-5 toggle mutes, F1-F5 solo,
//! M flips mute-all, arrows nudge every fader.

mod cli;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use stemstage::audio::{AudioEngine, SignalSampler, SpectrumAnalyzer, Stem};
use stemstage::catalog::Catalog;
use stemstage::mixer::{Mixer, TrackId, TRACK_COUNT};
use stemstage::params::{MotionParams, RenderConfig, SamplerConfig, SpectrumConfig, StageParams};
use stemstage::rendering::{BackdropUniforms, BarInstance, RenderSystem, Uniforms};
use stemstage::stage::StageSystem;

use cli::Args;

/// Per-fader step for the whole-mixer volume keys.
const VOLUME_NUDGE: f32 = 0.05;

/// Main application state
struct App {
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    stage: StageSystem,
    mixer: Option<Mixer<AudioEngine>>,

    args: Args,
    sampler_config: SamplerConfig,
    render_config: RenderConfig,

    // Instance scratch, reused every frame
    instances: Vec<BarInstance>,

    start_time: Instant,
}

impl App {
    fn new(args: Args) -> anyhow::Result<Self> {
        let sampler_config = SamplerConfig {
            resolution: args.resolution,
            ..SamplerConfig::default()
        };
        sampler_config
            .validate()
            .with_context(|| format!("invalid --resolution {}", args.resolution))?;

        let stage = StageSystem::new(
            &StageParams::default(),
            &sampler_config,
            MotionParams::default(),
        );

        Ok(Self {
            window: None,
            render_system: None,
            stage,
            mixer: None,
            args,
            sampler_config,
            render_config: RenderConfig::default(),
            instances: Vec::new(),
            start_time: Instant::now(),
        })
    }

    /// Decode the stems and bring up the playback engine and analyzers.
    /// Any track that fails stays not-ready; the rest of the stage runs.
    fn init_audio(&mut self) {
        let catalog = match Catalog::open(&self.args.stems) {
            Ok(catalog) => catalog,
            Err(err) => {
                error!("catalog unavailable: {err}");
                return;
            }
        };

        let mut stems: [Option<Stem>; TRACK_COUNT] = Default::default();
        for id in TrackId::ALL {
            match catalog.load_stem(id) {
                Ok(stem) => {
                    info!(
                        "stem {}: {} samples @ {}Hz",
                        id.label(),
                        stem.samples.len(),
                        stem.sample_rate_hz
                    );
                    stems[id.index()] = Some(stem);
                }
                Err(err) => warn!("stem {} unavailable: {err}", id.label()),
            }
        }

        let engine = match AudioEngine::new(stems, &self.sampler_config) {
            Ok(engine) => engine,
            Err(err) => {
                // Analyzer unavailable: the stage keeps rendering, silent.
                error!("audio unavailable: {err}");
                return;
            }
        };

        let device_rate = engine.sample_rate_hz();
        for id in TrackId::ALL {
            if !engine.has_stem(id.index()) {
                continue;
            }
            let sampler = match SignalSampler::new(engine.tap(id.index()), &self.sampler_config) {
                Ok(sampler) => sampler,
                Err(err) => {
                    warn!("analyzer for {} unavailable: {err}", id.label());
                    continue;
                }
            };
            let spectrum_config = SpectrumConfig {
                sample_rate_hz: device_rate as usize,
                ..SpectrumConfig::default()
            };
            let spectrum = match SpectrumAnalyzer::new(spectrum_config) {
                Ok(spectrum) => Some(spectrum),
                Err(err) => {
                    warn!("spectrum for {} unavailable: {err}", id.label());
                    None
                }
            };
            self.stage.attach(id, sampler, spectrum);
        }

        let mut mixer = Mixer::new(engine);
        mixer.mark_loaded();
        if self.args.autoplay {
            mixer.play_all();
        }
        self.mixer = Some(mixer);
    }

    fn handle_key(&mut self, code: KeyCode) {
        // Transport and faders only exist once the audio is up.
        let Some(mixer) = &mut self.mixer else {
            return;
        };

        match code {
            KeyCode::Space => mixer.toggle_play(),
            KeyCode::Digit1 => mixer.toggle_mute(TrackId::Vocal),
            KeyCode::Digit2 => mixer.toggle_mute(TrackId::Drum),
            KeyCode::Digit3 => mixer.toggle_mute(TrackId::Guitar),
            KeyCode::Digit4 => mixer.toggle_mute(TrackId::Bass),
            KeyCode::Digit5 => mixer.toggle_mute(TrackId::Piano),
            KeyCode::F1 => mixer.solo(TrackId::Vocal),
            KeyCode::F2 => mixer.solo(TrackId::Drum),
            KeyCode::F3 => mixer.solo(TrackId::Guitar),
            KeyCode::F4 => mixer.solo(TrackId::Bass),
            KeyCode::F5 => mixer.solo(TrackId::Piano),
            KeyCode::KeyM => mixer.mute_all_or_unmute_all(),
            KeyCode::KeyC => mixer.clear(),
            KeyCode::ArrowUp => {
                for id in TrackId::ALL {
                    let volume = mixer.track(id).volume + VOLUME_NUDGE;
                    mixer.set_volume(id, volume);
                }
            }
            KeyCode::ArrowDown => {
                for id in TrackId::ALL {
                    let volume = mixer.track(id).volume - VOLUME_NUDGE;
                    mixer.set_volume(id, volume);
                }
            }
            _ => {}
        }
    }

    /// Render a single frame
    fn render_frame(&mut self) {
        let Some(render_system) = &self.render_system else {
            return;
        };

        let time_s = self.start_time.elapsed().as_secs_f32();

        // One cooperative analysis/smoothing pass for all five tracks
        self.stage.update();

        self.instances.clear();
        for track in self.stage.tracks() {
            if !track.is_live() {
                continue; // not loaded: no bars for this track
            }
            for (bar, seed) in track.bars().iter().zip(track.layout().seeds()) {
                self.instances.push(BarInstance {
                    position: bar.position().to_array(),
                    color: seed.color,
                });
            }
        }
        let instance_count = render_system.update_instances(&self.instances);

        let uniforms = Uniforms {
            view_proj: RenderSystem::view_proj(&self.render_config).to_cols_array_2d(),
            bar_size: self.render_config.bar_size_m,
            time: time_s,
        };
        render_system.update_uniforms(&uniforms);

        let backdrop = BackdropUniforms {
            time: time_s,
            pulse: self.stage.low_band_pulse(),
            _padding: [0.0; 2],
        };
        render_system.update_backdrop_uniforms(&backdrop);

        if let Err(err) = render_system.render(instance_count) {
            warn!("render error: {err:?}");
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title("Stemstage")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                error!("failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        let capacity = TRACK_COUNT * self.sampler_config.resolution;
        let render_system =
            match pollster::block_on(RenderSystem::new(Arc::clone(&window), capacity)) {
                Ok(render_system) => render_system,
                Err(err) => {
                    error!("failed to initialize rendering: {err}");
                    event_loop.exit();
                    return;
                }
            };

        self.init_audio();

        info!("stage is up; press space to play, esc to quit");
        self.window = Some(window);
        self.render_system = Some(render_system);
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.stage.detach_all();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape {
                    self.stage.detach_all();
                    event_loop.exit();
                } else {
                    self.handle_key(code);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut app = App::new(args)?;
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.run_app(&mut app).context("event loop failed")?;
    Ok(())
}
