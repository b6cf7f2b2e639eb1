//! Stage placement of the five stem rings.

use glam::Vec3;

use crate::mixer::{TrackId, TRACK_COUNT};

/// Where one stem's ring sits and how wide it rests.
#[derive(Debug, Clone, Copy)]
pub struct StagePlacement {
    /// Ring center in world space (meters). All rings sit on the stage
    /// plane at y = -26, well below the camera.
    pub center: Vec3,

    /// Base ring radius (meters), before loudness modulation.
    pub radius_m: f32,
}

/// Placement of all five rings, indexed by [`TrackId::index`].
#[derive(Debug, Clone)]
pub struct StageParams {
    pub placements: [StagePlacement; TRACK_COUNT],
}

impl Default for StageParams {
    fn default() -> Self {
        Self {
            placements: [
                // vocal: front and center
                StagePlacement {
                    center: Vec3::new(0.0, -26.0, 30.0),
                    radius_m: 8.0,
                },
                // drum: stage right, the widest ring
                StagePlacement {
                    center: Vec3::new(32.0, -26.0, -10.0),
                    radius_m: 18.0,
                },
                // guitar: far stage right
                StagePlacement {
                    center: Vec3::new(75.0, -26.0, 10.0),
                    radius_m: 8.0,
                },
                // bass: far stage left, tight ring
                StagePlacement {
                    center: Vec3::new(-75.0, -26.0, 10.0),
                    radius_m: 4.0,
                },
                // piano: stage left, mirroring the drums
                StagePlacement {
                    center: Vec3::new(-32.0, -26.0, -10.0),
                    radius_m: 18.0,
                },
            ],
        }
    }
}

impl StageParams {
    pub fn placement(&self, id: TrackId) -> StagePlacement {
        self.placements[id.index()]
    }
}
