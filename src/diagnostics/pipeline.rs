use crate::diagnostics::{TimingBreakdown, ViewStage, WbfStage};
use crate::geometry::Pixel;
use crate::types::DetectionSet;
use serde::Serialize;

/// Result produced by the `*_with_diagnostics` entry points of
/// [`MoeDetector`](crate::MoeDetector).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FusionReport {
    pub detections: DetectionSet<Pixel>,
    pub trace: FusionTrace,
}

/// Stage-by-stage account of one fusion call.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FusionTrace {
    pub input: InputDescriptor,
    pub thresholds: Thresholds,
    pub timings: TimingBreakdown,
    /// One entry per view, identity first; single-view calls have one entry.
    pub views: Vec<ViewStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wbf: Option<WbfStage>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub experts: usize,
    pub views: usize,
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub confidence: f32,
    pub iou: f32,
}
