//! Weighted box fusion across augmented views.
//!
//! All detections from all views are visited in descending confidence (ties:
//! view order, then order within the view). A detection joins the same-label
//! cluster whose current fused box overlaps it most, provided that IoU
//! exceeds the threshold; otherwise it seeds a new cluster. After every join
//! the cluster's fused box is recomputed as the confidence-weighted mean of
//! its members' corners.
//!
//! The fused confidence is the aggregated member confidence scaled by
//! `min(size, n) / n`, where `n` is the number of views that produced any
//! detection. Objects confirmed by fewer views are therefore penalised.
//! Clusters whose fused confidence does not exceed the skip threshold are
//! dropped.
use crate::geometry::{BBox, Normalized};
use crate::types::{Detection, DetectionSet, Label};
use log::debug;
use nalgebra::Vector4;
use serde::{Deserialize, Serialize};

/// How member confidences are aggregated before the view-count penalty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceType {
    /// Mean member confidence.
    #[default]
    Avg,
    /// Highest member confidence.
    ///
    /// Not tied to the mean: a cluster with a higher mean can score lower
    /// than one with a single strong member.
    Max,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WbfParams {
    pub confidence_type: ConfidenceType,
}

/// Fused detections plus bookkeeping for diagnostics.
#[derive(Clone, Debug, Default)]
pub struct WbfOutcome {
    pub detections: DetectionSet<Normalized>,
    pub input_detections: usize,
    pub contributing_views: usize,
    pub clusters: usize,
    pub dropped: usize,
}

struct Cluster {
    label: Label,
    weighted_sum: Vector4<f32>,
    coord_sum: Vector4<f32>,
    conf_sum: f32,
    max_conf: f32,
    size: usize,
    fused: BBox<Normalized>,
}

impl Cluster {
    fn seed(det: &Detection<Normalized>) -> Self {
        let v = det.bbox.as_vector();
        Self {
            label: det.label,
            weighted_sum: v * det.confidence,
            coord_sum: v,
            conf_sum: det.confidence,
            max_conf: det.confidence,
            size: 1,
            fused: det.bbox,
        }
    }

    fn push(&mut self, det: &Detection<Normalized>) {
        let v = det.bbox.as_vector();
        self.weighted_sum += v * det.confidence;
        self.coord_sum += v;
        self.conf_sum += det.confidence;
        self.max_conf = self.max_conf.max(det.confidence);
        self.size += 1;
        self.fused = if self.conf_sum > 0.0 {
            BBox::from_vector(&(self.weighted_sum / self.conf_sum))
        } else {
            BBox::from_vector(&(self.coord_sum / self.size as f32))
        };
    }

    fn confidence(&self, num_views: usize, ty: ConfidenceType) -> f32 {
        let base = match ty {
            ConfidenceType::Avg => self.conf_sum / self.size as f32,
            ConfidenceType::Max => self.max_conf,
        };
        base * view_coverage(self.size, num_views)
    }
}

/// `min(size, num_views) / num_views`, or 0 when no view contributed.
fn view_coverage(size: usize, num_views: usize) -> f32 {
    if num_views == 0 {
        return 0.0;
    }
    size.min(num_views) as f32 / num_views as f32
}

/// Fused confidence of a cluster with the given member confidences.
pub fn cluster_confidence(confidences: &[f32], num_views: usize, ty: ConfidenceType) -> f32 {
    if confidences.is_empty() {
        return 0.0;
    }
    let base = match ty {
        ConfidenceType::Avg => confidences.iter().sum::<f32>() / confidences.len() as f32,
        ConfidenceType::Max => confidences.iter().copied().fold(0.0, f32::max),
    };
    base * view_coverage(confidences.len(), num_views)
}

/// Fuse per-view detection sets in unit-square coordinates.
///
/// Views with no detections are ignored, including for the view count.
pub fn weighted_box_fusion(
    views: &[DetectionSet<Normalized>],
    iou_threshold: f32,
    skip_threshold: f32,
    params: &WbfParams,
) -> WbfOutcome {
    let num_views = views.iter().filter(|v| !v.is_empty()).count();
    let pool: Vec<Detection<Normalized>> = views.iter().flatten().copied().collect();
    if pool.is_empty() {
        return WbfOutcome::default();
    }

    let mut clusters: Vec<Cluster> = Vec::new();
    for idx in crate::nms::confidence_order(&pool) {
        let det = &pool[idx];
        let mut best: Option<(usize, f32)> = None;
        for (ci, cluster) in clusters.iter().enumerate() {
            if cluster.label != det.label {
                continue;
            }
            let iou = cluster.fused.iou(&det.bbox);
            if iou > iou_threshold && best.map_or(true, |(_, b)| iou > b) {
                best = Some((ci, iou));
            }
        }
        match best {
            Some((ci, _)) => clusters[ci].push(det),
            None => clusters.push(Cluster::seed(det)),
        }
    }

    let cluster_count = clusters.len();
    let mut fused: Vec<Detection<Normalized>> = clusters
        .iter()
        .map(|c| Detection::new(c.fused, c.confidence(num_views, params.confidence_type), c.label))
        .filter(|d| d.confidence > skip_threshold)
        .collect();
    let order = crate::nms::confidence_order(&fused);
    fused = order.into_iter().map(|i| fused[i]).collect();

    debug!(
        "weighted_box_fusion views={} inputs={} clusters={} kept={}",
        num_views,
        pool.len(),
        cluster_count,
        fused.len()
    );

    WbfOutcome {
        dropped: cluster_count - fused.len(),
        detections: fused,
        input_detections: pool.len(),
        contributing_views: num_views,
        clusters: cluster_count,
    }
}
