//! Per-frame binding of stem signals to bar animation.
//!
//! [`StageSystem`] owns one ring of bars per track and, once per frame,
//! pulls each live track's snapshot and drives its bars through the motion
//! model. Tracks are fully independent: a stem that never loaded, or whose
//! analyzer could not be built, is simply skipped every frame while the
//! other four keep animating.

mod layout;
mod motion;

pub use layout::{BarSeed, RadialLayout};
pub use motion::BarMotion;

use log::debug;

use crate::audio::{BandLevels, SignalSampler, SpectrumAnalyzer};
use crate::mixer::TrackId;
use crate::params::{MotionParams, SamplerConfig, StageParams};

/// One stem's ring: static layout, the bar arena, and its signal inputs.
pub struct TrackStage {
    id: TrackId,
    layout: RadialLayout,
    bars: Vec<BarMotion>,
    sampler: Option<SignalSampler>,
    spectrum: Option<SpectrumAnalyzer>,
    levels: BandLevels,
}

impl TrackStage {
    fn new(id: TrackId, layout: RadialLayout) -> Self {
        let bars = layout
            .seeds()
            .iter()
            .map(|seed| BarMotion::new(seed.theta, seed.position))
            .collect();
        Self {
            id,
            layout,
            bars,
            sampler: None,
            spectrum: None,
            levels: BandLevels::default(),
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn layout(&self) -> &RadialLayout {
        &self.layout
    }

    pub fn bars(&self) -> &[BarMotion] {
        &self.bars
    }

    /// Whether this track has a live analyzer attached. Tracks that are not
    /// live render nothing.
    pub fn is_live(&self) -> bool {
        self.sampler.is_some()
    }

    /// Latest band levels; zero until the spectrum window fills.
    pub fn levels(&self) -> BandLevels {
        self.levels
    }

    fn update(&mut self, motion: &MotionParams) {
        let Some(sampler) = &self.sampler else {
            return;
        };
        // Not ready yet: hold every bar's last transform.
        let Some(snapshot) = sampler.sample() else {
            return;
        };

        let mean_level = snapshot.centered_mean();
        let center = self.layout.center();
        let radius = self.layout.radius_m();
        for (index, bar) in self.bars.iter_mut().enumerate() {
            bar.update(snapshot.centered(index), mean_level, center, radius, motion);
        }

        if let Some(spectrum) = &mut self.spectrum {
            let window = sampler.raw_window(spectrum.config().fft_size);
            if let Some(window) = window {
                if let Some(levels) = spectrum.analyze(&window) {
                    self.levels = levels;
                }
            }
        }
    }

    fn detach(&mut self) {
        if let Some(sampler) = &mut self.sampler {
            sampler.detach();
        }
        self.sampler = None;
        self.levels = BandLevels::default();
    }
}

/// The five rings plus the shared motion parameters.
pub struct StageSystem {
    tracks: Vec<TrackStage>,
    motion: MotionParams,
}

impl StageSystem {
    /// Build the rings from the stage placements. Samplers are attached
    /// later, per track, once its audio is ready.
    pub fn new(stage: &StageParams, sampler_config: &SamplerConfig, motion: MotionParams) -> Self {
        let tracks = TrackId::ALL
            .into_iter()
            .map(|id| {
                let placement = stage.placement(id);
                let layout = RadialLayout::new(
                    placement.center,
                    placement.radius_m,
                    sampler_config.resolution,
                );
                TrackStage::new(id, layout)
            })
            .collect();
        Self { tracks, motion }
    }

    /// Attach a live sampler (and optionally a spectrum analyzer) for one
    /// track. Replaces any previous attachment.
    pub fn attach(
        &mut self,
        id: TrackId,
        sampler: SignalSampler,
        spectrum: Option<SpectrumAnalyzer>,
    ) {
        debug_assert_eq!(
            sampler.resolution(),
            self.tracks[id.index()].layout.len(),
            "sampler resolution must match the ring's bin count"
        );
        let track = &mut self.tracks[id.index()];
        track.sampler = Some(sampler);
        track.spectrum = spectrum;
        debug!("stage: {} analyzer attached", id.label());
    }

    /// One cooperative frame step. Completes synchronously; each track's
    /// update touches only its own bars.
    pub fn update(&mut self) {
        for track in &mut self.tracks {
            track.update(&self.motion);
        }
    }

    pub fn tracks(&self) -> &[TrackStage] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> &TrackStage {
        &self.tracks[id.index()]
    }

    /// Total bars across live tracks, for sizing instance buffers.
    pub fn live_bar_count(&self) -> usize {
        self.tracks
            .iter()
            .filter(|t| t.is_live())
            .map(|t| t.bars.len())
            .sum()
    }

    /// Aggregate low-band energy across live tracks, for the backdrop
    /// pulse.
    pub fn low_band_pulse(&self) -> f32 {
        let live = self.tracks.iter().filter(|t| t.is_live());
        let (sum, count) = live.fold((0.0f32, 0usize), |(sum, count), track| {
            (sum + track.levels.low, count + 1)
        });
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }

    /// Tear down every track's analyzer. Idempotent; bars hold their last
    /// transforms and no further per-frame work happens for them.
    pub fn detach_all(&mut self) {
        for track in &mut self.tracks {
            track.detach();
        }
    }
}
