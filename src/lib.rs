#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod detector;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod image;
pub mod models;
pub mod types;

// Algorithm modules – public so they can be driven stage by stage.
pub mod augment;
pub mod config;
pub mod nms;
pub mod wbf;

// --- High-level re-exports -------------------------------------------------

// Main entry points: detector + parameters.
pub use crate::detector::{FusionParams, MoeDetector, WeightedDetectionMerger};
pub use crate::error::{ConfigError, FusionError, Result};
pub use crate::types::{Detection, DetectionSet, Label};

// Geometry that callers need to build detections.
pub use crate::geometry::{BBox, ImageSize, Normalized, Pixel};

// High-level diagnostics returned by the detector.
pub use crate::diagnostics::{FusionReport, FusionTrace};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use moe_fusion::prelude::*;
///
/// # fn main() -> moe_fusion::Result<()> {
/// let image = ImageF32::new(640, 480, 3);
/// let expert = FixedExpert::new(
///     "day",
///     vec![Detection::new(BBox::new(10.0, 10.0, 50.0, 50.0), 0.9, 0)],
/// );
/// let pool = ExpertPool::new(vec![Box::new(expert)])?;
/// let gate = FixedGate::new(GateWeights::uniform(1));
/// let detector = MoeDetector::new(Box::new(gate), pool, FusionParams::default())?;
///
/// let fused = detector.moe_infer_tta(&image, 0.3, 0.55)?;
/// println!("found {} objects", fused.len());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::ImageF32;
    pub use crate::models::{
        ExpertDetector, ExpertPool, FixedExpert, FixedGate, GateWeights, GatingWeightProvider,
    };
    pub use crate::{BBox, Detection, FusionParams, MoeDetector};
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    pub use crate::augment::{Augmentation, AugmentationGenerator, View, ViewTransform};
    pub use crate::nms::{non_maximum_suppression, SuppressionMode};
    pub use crate::wbf::{cluster_confidence, weighted_box_fusion, ConfidenceType, WbfParams};

    pub use crate::diagnostics::{
        ExpertStage, InputDescriptor, MergeStage, StageTiming, Thresholds, TimingBreakdown,
        ViewStage, WbfStage,
    };
}
