use crate::augment::ViewTransform;
use serde::Serialize;

/// What one expert contributed to a single-view merge.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertStage {
    pub index: usize,
    pub name: String,
    pub weight: f32,
    /// Detections the expert returned.
    pub raw: usize,
    /// Detections left after gate scaling and the confidence threshold.
    pub passed: usize,
    pub elapsed_ms: f64,
}

/// Gate-weighted merge and suppression on one image.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStage {
    pub gate_weights: Vec<f32>,
    pub experts: Vec<ExpertStage>,
    /// Size of the pooled set entering suppression.
    pub pooled: usize,
    pub kept: usize,
    pub gating_ms: f64,
    pub nms_ms: f64,
    pub elapsed_ms: f64,
}

impl MergeStage {
    pub fn suppressed(&self) -> usize {
        self.pooled - self.kept
    }
}

/// One augmented view run through the merge stage.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStage {
    pub name: String,
    pub transform: ViewTransform,
    pub merge: MergeStage,
}

/// Cross-view weighted box fusion.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WbfStage {
    pub input_detections: usize,
    pub contributing_views: usize,
    pub clusters: usize,
    pub kept: usize,
    pub dropped: usize,
    pub elapsed_ms: f64,
}
