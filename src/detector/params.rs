//! Parameter types configuring the fusion stages.
//!
//! The thresholds here are the defaults used by [`MoeDetector::detect`] and
//! [`MoeDetector::detect_tta`]; the explicit `moe_infer*` entry points take
//! their thresholds per call and only read the mode knobs from this struct.
//!
//! [`MoeDetector::detect`]: crate::MoeDetector::detect
//! [`MoeDetector::detect_tta`]: crate::MoeDetector::detect_tta

use crate::augment::{default_menu, Augmentation};
use crate::error::{FusionError, Result};
use crate::nms::SuppressionMode;
use crate::wbf::WbfParams;
use serde::{Deserialize, Serialize};

/// Detector-wide parameters for the single-view and multi-view pipelines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionParams {
    /// Gate-scaled confidences at or below this value are dropped; also the
    /// skip threshold applied to fused clusters.
    pub conf_threshold: f32,
    /// IoU above which NMS suppresses and WBF clusters.
    pub iou_threshold: f32,
    /// Whether suppression crosses label boundaries.
    pub suppression: SuppressionMode,
    pub wbf: WbfParams,
    /// Views generated after the identity view, in order.
    pub augmentations: Vec<Augmentation>,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            conf_threshold: 0.3,
            iou_threshold: 0.5,
            suppression: SuppressionMode::ClassAgnostic,
            wbf: WbfParams::default(),
            augmentations: default_menu(),
        }
    }
}

impl FusionParams {
    pub fn validate(&self) -> Result<()> {
        check_thresholds(self.conf_threshold, self.iou_threshold)
    }
}

/// Both thresholds must be finite and within `[0, 1]`.
pub fn check_thresholds(conf_threshold: f32, iou_threshold: f32) -> Result<()> {
    for (name, value) in [("confidence", conf_threshold), ("iou", iou_threshold)] {
        if !(0.0..=1.0).contains(&value) {
            return Err(FusionError::config(format!(
                "{name} threshold {value} outside [0, 1]"
            )));
        }
    }
    Ok(())
}
