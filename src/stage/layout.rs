//! Radial bar layout around a stem's stage position.

use std::f32::consts::TAU;

use glam::Vec3;

/// Static identity of one bar: where it starts and the color it keeps.
#[derive(Debug, Clone)]
pub struct BarSeed {
    /// Seed angle on the ring (radians).
    pub theta: f32,
    /// Seed position on the ring, at the stage plane.
    pub position: Vec3,
    /// Linear RGB, fixed for the bar's lifetime.
    pub color: [f32; 3],
}

/// Evenly spaced ring of bar seeds.
///
/// Seeds are computed once per (center, radius, bins) and never regenerated
/// while the bars are alive — the motion state animates *away* from them,
/// so rebuilding seeds mid-flight would snap the bars back.
#[derive(Debug, Clone)]
pub struct RadialLayout {
    center: Vec3,
    radius_m: f32,
    seeds: Vec<BarSeed>,
}

impl RadialLayout {
    pub fn new(center: Vec3, radius_m: f32, bins: usize) -> Self {
        let seeds = (0..bins)
            .map(|i| {
                let theta = i as f32 / bins as f32 * TAU;
                let position = Vec3::new(
                    center.x + radius_m * theta.cos(),
                    center.y,
                    center.z + radius_m * theta.sin(),
                );
                // Hue striped around the ring, full saturation, mid
                // lightness
                let hue = i as f32 / bins as f32 * 360.0;
                BarSeed {
                    theta,
                    position,
                    color: hsl_to_rgb(hue, 1.0, 0.5),
                }
            })
            .collect();
        Self {
            center,
            radius_m,
            seeds,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius_m(&self) -> f32 {
        self.radius_m
    }

    pub fn seeds(&self) -> &[BarSeed] {
        &self.seeds
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }
}

/// Convert HSL (hue in degrees, saturation/lightness in [0, 1]) to RGB.
fn hsl_to_rgb(hue_deg: f32, saturation: f32, lightness: f32) -> [f32; 3] {
    let hue = hue_deg.rem_euclid(360.0);
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = chroma * (1.0 - ((hue / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = lightness - chroma / 2.0;

    let (r, g, b) = match hue as u32 {
        0..=59 => (chroma, x, 0.0),
        60..=119 => (x, chroma, 0.0),
        120..=179 => (0.0, chroma, x),
        180..=239 => (0.0, x, chroma),
        240..=299 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    [r + m, g + m, b + m]
}
