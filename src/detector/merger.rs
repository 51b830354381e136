//! Single-view mixture-of-experts merge.
//!
//! Every expert runs on the same image; its confidences are multiplied by its
//! gate weight and anything at or below the confidence threshold is dropped.
//! Survivors from all experts are pooled (expert order, then output order)
//! and greedy NMS picks the final set. Once pooled, detections no longer
//! remember which expert produced them.
use crate::diagnostics::{elapsed_ms, ExpertStage, MergeStage};
use crate::error::Result;
use crate::geometry::Pixel;
use crate::image::ImageF32;
use crate::models::{ExpertPool, GatingWeightProvider};
use crate::nms::{non_maximum_suppression, SuppressionMode};
use crate::types::DetectionSet;
use log::debug;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Borrowing view over the gate and experts that performs one merge.
pub struct WeightedDetectionMerger<'a> {
    gate: &'a dyn GatingWeightProvider,
    experts: &'a ExpertPool,
    suppression: SuppressionMode,
}

/// Merged detections with the per-expert bookkeeping.
pub struct MergeOutcome {
    pub detections: DetectionSet<Pixel>,
    pub stage: MergeStage,
}

struct ExpertRun {
    detections: DetectionSet<Pixel>,
    elapsed_ms: f64,
}

impl<'a> WeightedDetectionMerger<'a> {
    pub fn new(
        gate: &'a dyn GatingWeightProvider,
        experts: &'a ExpertPool,
        suppression: SuppressionMode,
    ) -> Self {
        Self {
            gate,
            experts,
            suppression,
        }
    }

    /// Run the merge on `image`, returning only the fused detections.
    pub fn merge(
        &self,
        image: &ImageF32,
        conf_threshold: f32,
        iou_threshold: f32,
    ) -> Result<DetectionSet<Pixel>> {
        Ok(self
            .merge_with_diagnostics(image, conf_threshold, iou_threshold)?
            .detections)
    }

    pub fn merge_with_diagnostics(
        &self,
        image: &ImageF32,
        conf_threshold: f32,
        iou_threshold: f32,
    ) -> Result<MergeOutcome> {
        let start = Instant::now();

        let gating_start = Instant::now();
        let weights = self.gate.infer(image)?;
        weights.ensure_len(self.experts.len())?;
        let gating_ms = elapsed_ms(gating_start);
        debug!(
            "WeightedDetectionMerger::merge w={} h={} weights={:?}",
            image.w,
            image.h,
            weights.as_slice()
        );

        let runs = self.run_experts(image)?;

        let mut pool = Vec::new();
        let mut experts = Vec::with_capacity(runs.len());
        for (index, (run, &weight)) in runs.into_iter().zip(weights.as_slice()).enumerate() {
            let raw = run.detections.len();
            let before = pool.len();
            pool.extend(
                run.detections
                    .iter()
                    .map(|det| det.with_confidence(det.confidence * weight))
                    .filter(|det| det.confidence > conf_threshold),
            );
            experts.push(ExpertStage {
                index,
                name: self.experts.name(index).unwrap_or_default().to_string(),
                weight,
                raw,
                passed: pool.len() - before,
                elapsed_ms: run.elapsed_ms,
            });
        }

        let pooled = pool.len();
        let nms_start = Instant::now();
        let detections = non_maximum_suppression(&pool, iou_threshold, self.suppression);
        let nms_ms = elapsed_ms(nms_start);
        debug!(
            "WeightedDetectionMerger::merge pooled={} kept={}",
            pooled,
            detections.len()
        );

        Ok(MergeOutcome {
            stage: MergeStage {
                gate_weights: weights.as_slice().to_vec(),
                experts,
                pooled,
                kept: detections.len(),
                gating_ms,
                nms_ms,
                elapsed_ms: elapsed_ms(start),
            },
            detections,
        })
    }

    /// Run every expert, collecting results in expert order.
    fn run_experts(&self, image: &ImageF32) -> Result<Vec<ExpertRun>> {
        let run_one = |index: usize| -> Result<ExpertRun> {
            let start = Instant::now();
            let detections = self.experts.infer(index, image)?;
            Ok(ExpertRun {
                detections,
                elapsed_ms: elapsed_ms(start),
            })
        };

        #[cfg(feature = "parallel")]
        let runs = (0..self.experts.len())
            .into_par_iter()
            .map(run_one)
            .collect::<Vec<_>>();
        #[cfg(not(feature = "parallel"))]
        let runs = (0..self.experts.len()).map(run_one).collect::<Vec<_>>();

        runs.into_iter().collect()
    }
}
