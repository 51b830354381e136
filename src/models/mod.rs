//! Capabilities wrapping the opaque models.
//!
//! The fusion core never looks inside the gating network or the expert
//! detectors. It only needs two capabilities:
//! - [`GatingWeightProvider`]: image → per-expert trust weights.
//! - [`ExpertDetector`]: image → raw detections with unscaled confidences.
//!
//! [`ExpertPool`] owns the experts and validates their output at the boundary.
//! [`fixed`] offers constant implementations used by the demo tool and tests.

pub mod fixed;
mod gate;
mod pool;

pub use fixed::{FixedExpert, FixedGate};
pub use gate::GateWeights;
pub use pool::ExpertPool;

use crate::error::Result;
use crate::geometry::Pixel;
use crate::image::ImageF32;
use crate::types::DetectionSet;

/// Produces gate weights for an image.
///
/// Implementations must return exactly one non-negative weight per expert,
/// summing to 1. The core checks length and sign, never renormalizes.
pub trait GatingWeightProvider: Send + Sync {
    fn infer(&self, image: &ImageF32) -> Result<GateWeights>;
}

/// A single expert detector.
///
/// Confidences are raw (not gate-scaled) and boxes are in the pixel frame of
/// the image passed in. No detections is an empty `Vec`, not an error.
pub trait ExpertDetector: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &str;

    fn infer(&self, image: &ImageF32) -> Result<DetectionSet<Pixel>>;
}
