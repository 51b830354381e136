//! Greedy non-maximum suppression over detection boxes.
//!
//! Detections are visited in descending confidence; each visited detection
//! that survives is kept and suppresses every later one whose IoU with it
//! exceeds the threshold. Sorting is stable, so exact confidence ties are
//! resolved by input order and the result is reproducible.
//!
//! [`SuppressionMode::ClassAgnostic`] lets any box suppress any other;
//! [`SuppressionMode::PerClass`] only suppresses within the same label, which
//! is equivalent to partitioning the pool by label first.
use crate::geometry::CoordSpace;
use crate::types::{Detection, DetectionSet};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionMode {
    #[default]
    ClassAgnostic,
    PerClass,
}

/// Indices of `detections` ordered by confidence descending, ties by index.
pub(crate) fn confidence_order<S: CoordSpace>(detections: &[Detection<S>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..detections.len()).collect();
    order.sort_by(|&a, &b| {
        detections[b]
            .confidence
            .total_cmp(&detections[a].confidence)
    });
    order
}

/// Run greedy NMS and return the kept detections, highest confidence first.
pub fn non_maximum_suppression<S: CoordSpace>(
    detections: &[Detection<S>],
    iou_threshold: f32,
    mode: SuppressionMode,
) -> DetectionSet<S> {
    if detections.is_empty() {
        return Vec::new();
    }

    let order = confidence_order(detections);
    let mut suppressed = vec![false; detections.len()];
    let mut kept = Vec::new();

    for (rank, &i) in order.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        let best = &detections[i];
        kept.push(*best);

        for &j in &order[rank + 1..] {
            if suppressed[j] {
                continue;
            }
            let other = &detections[j];
            if mode == SuppressionMode::PerClass && other.label != best.label {
                continue;
            }
            if best.bbox.iou(&other.bbox) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }
    kept
}
