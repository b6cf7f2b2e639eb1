//! Per-bar motion smoothing.
//!
//! Turns one bin's momentary amplitude plus the track-wide mean into a
//! smoothly animated position, evaluated once per render frame. Attack is
//! instant, decay exponential; the final position is low-pass filtered by
//! per-axis interpolation so frame-to-frame amplitude noise never jitters
//! the bar.

use std::f32::consts::TAU;

use glam::Vec3;

use crate::params::MotionParams;

/// Linear blend from `current` toward `target` by fraction `t`.
fn lerp(current: f32, target: f32, t: f32) -> f32 {
    current + (target - current) * t
}

/// Animation state for one bar. Lives in the owning track's bar arena and
/// is mutated in place each frame; never reallocated while the track's
/// analyzer is alive.
#[derive(Debug, Clone)]
pub struct BarMotion {
    /// Smoothed signal height. Never negative: attack only raises it above
    /// zero and decay only scales it down.
    height: f32,
    /// Current ring angle (radians), advancing every frame and wrapping at
    /// one full rotation.
    angle: f32,
    /// Live rendered position.
    position: Vec3,
}

impl BarMotion {
    pub fn new(seed_theta: f32, seed_position: Vec3) -> Self {
        Self {
            height: 0.0,
            angle: seed_theta,
            position: seed_position,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Advance one frame.
    ///
    /// `level` is this bin's centered amplitude in [-1, 1]; `mean_level`
    /// is the track's centered mean (see `Snapshot::centered_mean`).
    /// `center`/`radius_m` come from the bar's ring layout.
    pub fn update(
        &mut self,
        level: f32,
        mean_level: f32,
        center: Vec3,
        radius_m: f32,
        params: &MotionParams,
    ) {
        // Instant attack, exponential decay.
        if level > self.height {
            self.height = level;
        } else {
            self.height -= self.height * params.decay_rate;
        }

        self.angle = (self.angle + params.angle_step_rad) % TAU;

        // Track loudness pushes the whole ring outward in coarse steps.
        let power = (mean_level * params.power_gain).max(0.0);
        let ring = (power * params.power_quantum).round() * params.ring_step_m;

        let target = Vec3::new(
            center.x + (radius_m + ring) * self.angle.cos(),
            center.y + (1.0 + self.height * params.height_log_scale).ln() * params.height_gain_m,
            center.z + (radius_m + ring) * self.angle.sin(),
        );

        self.position.x = lerp(self.position.x, target.x, params.lerp_rate_xz);
        self.position.y = lerp(self.position.y, target.y, params.lerp_rate_y);
        self.position.z = lerp(self.position.z, target.z, params.lerp_rate_xz);
    }
}
