//! Multitrack mixer state machine.
//!
//! Single source of truth for the five stems' mute flags, volumes, and the
//! shared transport. Every command mutates the logical state and the backing
//! audio output in the same call, so the two can never diverge.

use log::debug;

/// Number of stems in a session. The stage is built around exactly five.
pub const TRACK_COUNT: usize = 5;

/// Default per-track volume at mixer initialization.
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Identity of one stem. Commands on a track outside this set are
/// unrepresentable; raw indices only appear at the backend boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackId {
    Vocal,
    Drum,
    Guitar,
    Bass,
    Piano,
}

impl TrackId {
    /// All tracks in backend index order.
    pub const ALL: [TrackId; TRACK_COUNT] = [
        TrackId::Vocal,
        TrackId::Drum,
        TrackId::Guitar,
        TrackId::Bass,
        TrackId::Piano,
    ];

    /// Backend index of this track (0..4, fixed order).
    pub fn index(self) -> usize {
        match self {
            TrackId::Vocal => 0,
            TrackId::Drum => 1,
            TrackId::Guitar => 2,
            TrackId::Bass => 3,
            TrackId::Piano => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<TrackId> {
        TrackId::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            TrackId::Vocal => "vocal",
            TrackId::Drum => "drum",
            TrackId::Guitar => "guitar",
            TrackId::Bass => "bass",
            TrackId::Piano => "piano",
        }
    }
}

/// Gain and transport interface of whatever actually produces sound.
///
/// The mixer never owns the audio resource; it only mutates gains and the
/// transport through this trait. Indices follow [`TrackId::index`].
pub trait AudioBackend {
    /// Observed transport state. May drift from the commanded state, which
    /// is why [`Mixer::toggle_play`] queries it instead of the logical flag.
    fn is_playing(&self) -> bool;
    fn volume(&self, index: usize) -> f32;
    fn set_volume(&mut self, index: usize, volume: f32);
    fn play(&mut self);
    fn pause(&mut self);
}

/// Logical state of one stem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackState {
    pub muted: bool,
    /// Stored volume in [0, 1]. Survives mute/unmute cycles; the backend
    /// gain is zeroed on mute while this keeps the last commanded value.
    pub volume: f32,
}

impl Default for TrackState {
    fn default() -> Self {
        Self {
            muted: false,
            volume: DEFAULT_VOLUME,
        }
    }
}

/// Mixer state machine over an [`AudioBackend`].
pub struct Mixer<B> {
    backend: B,
    tracks: [TrackState; TRACK_COUNT],
    loaded: bool,
    playing: bool,
}

impl<B: AudioBackend> Mixer<B> {
    /// Create a mixer over `backend` with every track unmuted at the
    /// default volume, and push those defaults down to the backend.
    pub fn new(backend: B) -> Self {
        let mut mixer = Self {
            backend,
            tracks: [TrackState::default(); TRACK_COUNT],
            loaded: false,
            playing: false,
        };
        for id in TrackId::ALL {
            mixer.backend.set_volume(id.index(), DEFAULT_VOLUME);
        }
        mixer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn track(&self, id: TrackId) -> TrackState {
        self.tracks[id.index()]
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Mark the backing audio as ready. Called once the stems are decoded
    /// and the output stream is live.
    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Set a track's volume, logically and on the backend gain, in one step.
    /// Out-of-range input is clamped to [0, 1].
    pub fn set_volume(&mut self, id: TrackId, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.tracks[id.index()].volume = volume;
        self.backend.set_volume(id.index(), volume);
        debug!("mixer: {} volume -> {:.2}", id.label(), volume);
    }

    /// Mute a track: flag set, backend gain zeroed, stored volume untouched.
    pub fn mute(&mut self, id: TrackId) {
        self.tracks[id.index()].muted = true;
        self.backend.set_volume(id.index(), 0.0);
        debug!("mixer: {} muted", id.label());
    }

    /// Unmute a track, restoring the stored logical volume (not a default).
    pub fn unmute(&mut self, id: TrackId) {
        let track = &mut self.tracks[id.index()];
        track.muted = false;
        let volume = track.volume;
        self.backend.set_volume(id.index(), volume);
        debug!("mixer: {} unmuted -> {:.2}", id.label(), volume);
    }

    pub fn toggle_mute(&mut self, id: TrackId) {
        if self.tracks[id.index()].muted {
            self.unmute(id);
        } else {
            self.mute(id);
        }
    }

    /// Solo a track: unmute it, mute every other track. Stored volumes of
    /// the muted tracks are untouched. Not sticky: soloing B after A leaves
    /// A muted, and there is no automatic un-solo.
    pub fn solo(&mut self, id: TrackId) {
        for other in TrackId::ALL {
            if other == id {
                self.unmute(other);
            } else {
                self.mute(other);
            }
        }
        debug!("mixer: solo {}", id.label());
    }

    /// Command every stem to play in lockstep.
    pub fn play_all(&mut self) {
        self.backend.play();
        self.playing = true;
        debug!("mixer: play");
    }

    /// Command every stem to pause in lockstep.
    pub fn pause_all(&mut self) {
        self.backend.pause();
        self.playing = false;
        debug!("mixer: pause");
    }

    /// Toggle the transport based on the backend's *observed* play state.
    /// Playback can drift from the commanded state (a stream can stop on
    /// its own), so the logical flag alone is not trusted here.
    pub fn toggle_play(&mut self) {
        if self.backend.is_playing() {
            self.pause_all();
        } else {
            self.play_all();
        }
    }

    /// If every track is muted, unmute all (each to its stored volume);
    /// otherwise mute all. The all-muted predicate is recomputed on every
    /// call, never cached.
    pub fn mute_all_or_unmute_all(&mut self) {
        let all_muted = self.tracks.iter().all(|t| t.muted);
        for id in TrackId::ALL {
            if all_muted {
                self.unmute(id);
            } else {
                self.mute(id);
            }
        }
    }

    /// Reset logical playback state: transport paused, loaded/playing flags
    /// cleared. Track identity survives — volumes and mute flags are kept.
    pub fn clear(&mut self) {
        self.backend.pause();
        self.playing = false;
        self.loaded = false;
        debug!("mixer: cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backend fake that records gains and transport commands.
    struct FakeBackend {
        gains: [f32; TRACK_COUNT],
        playing: bool,
        play_calls: usize,
        pause_calls: usize,
    }

    impl FakeBackend {
        fn new() -> Self {
            Self {
                gains: [0.0; TRACK_COUNT],
                playing: false,
                play_calls: 0,
                pause_calls: 0,
            }
        }
    }

    impl AudioBackend for FakeBackend {
        fn is_playing(&self) -> bool {
            self.playing
        }
        fn volume(&self, index: usize) -> f32 {
            self.gains[index]
        }
        fn set_volume(&mut self, index: usize, volume: f32) {
            self.gains[index] = volume;
        }
        fn play(&mut self) {
            self.playing = true;
            self.play_calls += 1;
        }
        fn pause(&mut self) {
            self.playing = false;
            self.pause_calls += 1;
        }
    }

    fn mixer() -> Mixer<FakeBackend> {
        Mixer::new(FakeBackend::new())
    }

    #[test]
    fn new_pushes_default_volumes_to_backend() {
        let m = mixer();
        for id in TrackId::ALL {
            assert_eq!(m.backend().volume(id.index()), DEFAULT_VOLUME);
            assert!(!m.track(id).muted);
        }
    }

    #[test]
    fn set_volume_updates_logical_and_external_state() {
        let mut m = mixer();
        m.set_volume(TrackId::Bass, 0.2);
        assert_eq!(m.track(TrackId::Bass).volume, 0.2);
        assert_eq!(m.backend().volume(TrackId::Bass.index()), 0.2);
        // only bass changed
        for id in [TrackId::Vocal, TrackId::Drum, TrackId::Guitar, TrackId::Piano] {
            assert_eq!(m.track(id).volume, DEFAULT_VOLUME);
            assert_eq!(m.backend().volume(id.index()), DEFAULT_VOLUME);
        }
    }

    #[test]
    fn set_volume_clamps_to_unit_range() {
        let mut m = mixer();
        m.set_volume(TrackId::Drum, 1.7);
        assert_eq!(m.track(TrackId::Drum).volume, 1.0);
        m.set_volume(TrackId::Drum, -0.3);
        assert_eq!(m.track(TrackId::Drum).volume, 0.0);
    }

    #[test]
    fn mute_unmute_round_trip_restores_stored_volume() {
        let mut m = mixer();
        m.set_volume(TrackId::Guitar, 0.8);
        m.mute(TrackId::Guitar);
        assert!(m.track(TrackId::Guitar).muted);
        assert_eq!(m.backend().volume(TrackId::Guitar.index()), 0.0);
        // stored volume survives the mute
        assert_eq!(m.track(TrackId::Guitar).volume, 0.8);

        m.unmute(TrackId::Guitar);
        assert!(!m.track(TrackId::Guitar).muted);
        assert_eq!(m.backend().volume(TrackId::Guitar.index()), 0.8);
    }

    #[test]
    fn toggle_mute_dispatches_on_current_flag() {
        let mut m = mixer();
        m.toggle_mute(TrackId::Vocal);
        assert!(m.track(TrackId::Vocal).muted);
        m.toggle_mute(TrackId::Vocal);
        assert!(!m.track(TrackId::Vocal).muted);
        assert_eq!(m.backend().volume(TrackId::Vocal.index()), DEFAULT_VOLUME);
    }

    #[test]
    fn solo_is_not_exclusive_sticky() {
        let mut m = mixer();
        m.solo(TrackId::Vocal);
        assert!(!m.track(TrackId::Vocal).muted);
        assert!(m.track(TrackId::Drum).muted);

        m.solo(TrackId::Drum);
        // vocal stays muted: no automatic un-solo
        assert!(m.track(TrackId::Vocal).muted);
        assert!(!m.track(TrackId::Drum).muted);
        assert_eq!(m.backend().volume(TrackId::Vocal.index()), 0.0);
        assert_eq!(m.backend().volume(TrackId::Drum.index()), DEFAULT_VOLUME);
    }

    #[test]
    fn solo_preserves_stored_volumes_of_muted_tracks() {
        let mut m = mixer();
        m.set_volume(TrackId::Piano, 0.9);
        m.solo(TrackId::Bass);
        assert_eq!(m.backend().volume(TrackId::Piano.index()), 0.0);
        assert_eq!(m.track(TrackId::Piano).volume, 0.9);
        m.unmute(TrackId::Piano);
        assert_eq!(m.backend().volume(TrackId::Piano.index()), 0.9);
    }

    #[test]
    fn mute_all_or_unmute_all_toggles_correctly() {
        let mut m = mixer();
        m.set_volume(TrackId::Drum, 0.3);

        // mixed state: one call mutes everything
        m.mute(TrackId::Vocal);
        m.mute_all_or_unmute_all();
        for id in TrackId::ALL {
            assert!(m.track(id).muted);
            assert_eq!(m.backend().volume(id.index()), 0.0);
        }

        // all muted: one call unmutes everything to stored volumes
        m.mute_all_or_unmute_all();
        for id in TrackId::ALL {
            assert!(!m.track(id).muted);
        }
        assert_eq!(m.backend().volume(TrackId::Drum.index()), 0.3);
        assert_eq!(m.backend().volume(TrackId::Vocal.index()), DEFAULT_VOLUME);
    }

    #[test]
    fn muted_track_still_receives_play_command() {
        let mut m = mixer();
        m.mute(TrackId::Drum);
        m.play_all();
        // play/pause is independent of mute: the transport ran, the gain
        // stayed zero
        assert_eq!(m.backend().play_calls, 1);
        assert!(m.backend().is_playing());
        assert_eq!(m.backend().volume(TrackId::Drum.index()), 0.0);
    }

    #[test]
    fn toggle_play_queries_observed_transport_state() {
        let mut m = mixer();
        m.play_all();
        assert!(m.is_playing());

        // transport drifts: the stream stopped on its own
        m.backend.playing = false;
        m.toggle_play();
        // observed state was "stopped", so toggle plays again
        assert!(m.backend().is_playing());
        assert_eq!(m.backend().play_calls, 2);
    }

    #[test]
    fn clear_resets_transport_but_keeps_track_state() {
        let mut m = mixer();
        m.mark_loaded();
        m.set_volume(TrackId::Guitar, 0.6);
        m.mute(TrackId::Piano);
        m.play_all();

        m.clear();
        assert!(!m.is_playing());
        assert!(!m.is_loaded());
        assert_eq!(m.backend().pause_calls, 1);
        // identity survives
        assert_eq!(m.track(TrackId::Guitar).volume, 0.6);
        assert!(m.track(TrackId::Piano).muted);
    }

    #[test]
    fn track_id_round_trips_through_index() {
        for id in TrackId::ALL {
            assert_eq!(TrackId::from_index(id.index()), Some(id));
        }
        assert_eq!(TrackId::from_index(TRACK_COUNT), None);
    }
}
