//! Parameter definitions with documented units and semantics.
//!
//! Every constant that shapes the stage lives here with its meaning and
//! default spelled out, so the animation can be tuned without digging
//! through the systems that consume it.

mod analysis;
mod motion;
mod render;
mod stage;

pub use analysis::{SamplerConfig, SpectrumConfig};
pub use motion::MotionParams;
pub use render::RenderConfig;
pub use stage::{StageParams, StagePlacement};
