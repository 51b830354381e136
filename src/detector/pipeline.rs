//! Detector pipeline driving single-view and multi-view fusion end-to-end.
//!
//! [`MoeDetector`] owns the gating provider, the expert pool and the
//! augmentation menu. It exposes two entry points:
//! - [`MoeDetector::moe_infer`] merges the experts on one image.
//! - [`MoeDetector::moe_infer_tta`] runs `moe_infer` on every augmented view,
//!   maps the results into the unit square of the source frame, fuses them
//!   with weighted box fusion and maps back to source pixels.
//!
//! Typical usage:
//! ```no_run
//! use moe_fusion::models::{ExpertPool, FixedExpert, FixedGate, GateWeights};
//! use moe_fusion::image::ImageF32;
//! use moe_fusion::{FusionParams, MoeDetector};
//!
//! # fn example(image: ImageF32) -> moe_fusion::Result<()> {
//! let pool = ExpertPool::new(vec![Box::new(FixedExpert::empty("day"))])?;
//! let gate = FixedGate::new(GateWeights::uniform(1));
//! let detector = MoeDetector::new(Box::new(gate), pool, FusionParams::default())?;
//! let report = detector.moe_infer_tta_with_diagnostics(&image, 0.3, 0.55)?;
//! println!("fused {} detections", report.detections.len());
//! # Ok(())
//! # }
//! ```
use super::merger::WeightedDetectionMerger;
use super::params::{check_thresholds, FusionParams};
use crate::augment::{AugmentationGenerator, View, ViewTransform};
use crate::diagnostics::{
    elapsed_ms, FusionReport, FusionTrace, InputDescriptor, Thresholds, TimingBreakdown,
    ViewStage, WbfStage,
};
use crate::error::{FusionError, Result};
use crate::geometry::{Normalized, Pixel};
use crate::image::{ImageF32, ImageView};
use crate::models::{ExpertPool, GatingWeightProvider};
use crate::types::{Detection, DetectionSet};
use crate::wbf::weighted_box_fusion;
use log::debug;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Mixture-of-experts detector with optional test-time augmentation.
///
/// Holds no per-call state; every call is independent and `&self` methods
/// may run concurrently.
pub struct MoeDetector {
    params: FusionParams,
    gate: Box<dyn GatingWeightProvider>,
    experts: ExpertPool,
    augmenter: AugmentationGenerator,
}

/// Per-view merge result, already mapped into the source unit square.
struct ViewRun {
    detections: DetectionSet<Normalized>,
    stage: ViewStage,
}

impl MoeDetector {
    /// Create a detector; fails if the parameters or the augmentation menu
    /// are invalid.
    pub fn new(
        gate: Box<dyn GatingWeightProvider>,
        experts: ExpertPool,
        params: FusionParams,
    ) -> Result<Self> {
        params.validate()?;
        let augmenter = AugmentationGenerator::new(params.augmentations.clone())?;
        Ok(Self {
            params,
            gate,
            experts,
            augmenter,
        })
    }

    pub fn params(&self) -> &FusionParams {
        &self.params
    }

    pub fn experts(&self) -> &ExpertPool {
        &self.experts
    }

    pub fn augmenter(&self) -> &AugmentationGenerator {
        &self.augmenter
    }

    fn merger(&self) -> WeightedDetectionMerger<'_> {
        WeightedDetectionMerger::new(self.gate.as_ref(), &self.experts, self.params.suppression)
    }

    /// Single-view inference using the configured default thresholds.
    pub fn detect(&self, image: &ImageF32) -> Result<DetectionSet<Pixel>> {
        self.moe_infer(image, self.params.conf_threshold, self.params.iou_threshold)
    }

    /// Multi-view inference using the configured default thresholds.
    pub fn detect_tta(&self, image: &ImageF32) -> Result<DetectionSet<Pixel>> {
        self.moe_infer_tta(image, self.params.conf_threshold, self.params.iou_threshold)
    }

    /// Gate-weighted merge of all experts on `image`.
    pub fn moe_infer(
        &self,
        image: &ImageF32,
        conf_threshold: f32,
        iou_threshold: f32,
    ) -> Result<DetectionSet<Pixel>> {
        check_thresholds(conf_threshold, iou_threshold)?;
        check_image(image)?;
        self.merger().merge(image, conf_threshold, iou_threshold)
    }

    /// Same as [`moe_infer`](Self::moe_infer), with a report holding a
    /// single identity view.
    pub fn moe_infer_with_diagnostics(
        &self,
        image: &ImageF32,
        conf_threshold: f32,
        iou_threshold: f32,
    ) -> Result<FusionReport> {
        check_thresholds(conf_threshold, iou_threshold)?;
        check_image(image)?;
        let start = Instant::now();
        let outcome = self
            .merger()
            .merge_with_diagnostics(image, conf_threshold, iou_threshold)?;

        let mut timings = TimingBreakdown::default();
        timings.push("gating", outcome.stage.gating_ms);
        timings.push("nms", outcome.stage.nms_ms);
        timings.total_ms = elapsed_ms(start);

        Ok(FusionReport {
            detections: outcome.detections,
            trace: FusionTrace {
                input: self.describe_input(image, 1),
                thresholds: Thresholds {
                    confidence: conf_threshold,
                    iou: iou_threshold,
                },
                timings,
                views: vec![ViewStage {
                    name: "identity".to_string(),
                    transform: ViewTransform::Identity,
                    merge: outcome.stage,
                }],
                wbf: None,
            },
        })
    }

    /// Test-time-augmented inference fused with weighted box fusion.
    pub fn moe_infer_tta(
        &self,
        image: &ImageF32,
        conf_threshold: f32,
        iou_threshold: f32,
    ) -> Result<DetectionSet<Pixel>> {
        Ok(self
            .moe_infer_tta_with_diagnostics(image, conf_threshold, iou_threshold)?
            .detections)
    }

    pub fn moe_infer_tta_with_diagnostics(
        &self,
        image: &ImageF32,
        conf_threshold: f32,
        iou_threshold: f32,
    ) -> Result<FusionReport> {
        check_thresholds(conf_threshold, iou_threshold)?;
        check_image(image)?;
        let start = Instant::now();
        debug!(
            "MoeDetector::moe_infer_tta start w={} h={} views={}",
            image.w,
            image.h,
            self.augmenter.view_count()
        );

        let augment_start = Instant::now();
        let views = self.augmenter.generate(image);
        let augment_ms = elapsed_ms(augment_start);

        let views_start = Instant::now();
        let runs = self.run_views(&views, conf_threshold, iou_threshold)?;
        let views_ms = elapsed_ms(views_start);

        let mut per_view = Vec::with_capacity(runs.len());
        let mut stages = Vec::with_capacity(runs.len());
        for run in runs {
            per_view.push(run.detections);
            stages.push(run.stage);
        }

        let wbf_start = Instant::now();
        let fused = weighted_box_fusion(&per_view, iou_threshold, conf_threshold, &self.params.wbf);
        let wbf_ms = elapsed_ms(wbf_start);

        let size = image.size();
        let detections: DetectionSet<Pixel> = fused
            .detections
            .iter()
            .map(|det| det.denormalize(size))
            .collect();
        debug!(
            "MoeDetector::moe_infer_tta views={} contributing={} fused={}",
            views.len(),
            fused.contributing_views,
            detections.len()
        );

        let mut timings = TimingBreakdown::default();
        timings.push("augment", augment_ms);
        timings.push("views", views_ms);
        timings.push("wbf", wbf_ms);
        timings.total_ms = elapsed_ms(start);

        Ok(FusionReport {
            detections,
            trace: FusionTrace {
                input: self.describe_input(image, views.len()),
                thresholds: Thresholds {
                    confidence: conf_threshold,
                    iou: iou_threshold,
                },
                timings,
                views: stages,
                wbf: Some(WbfStage {
                    input_detections: fused.input_detections,
                    contributing_views: fused.contributing_views,
                    clusters: fused.clusters,
                    kept: fused.detections.len(),
                    dropped: fused.dropped,
                    elapsed_ms: wbf_ms,
                }),
            },
        })
    }

    /// Merge each view and map its detections into the source unit square.
    /// Results stay in view order whatever order the views finish in.
    fn run_views(
        &self,
        views: &[View],
        conf_threshold: f32,
        iou_threshold: f32,
    ) -> Result<Vec<ViewRun>> {
        let merger = self.merger();
        let run_one = |view: &View| -> Result<ViewRun> {
            let outcome =
                merger.merge_with_diagnostics(&view.image, conf_threshold, iou_threshold)?;
            let view_size = view.image.size();
            let detections = outcome
                .detections
                .iter()
                .map(|det| {
                    let n = det.normalize(view_size);
                    Detection::new(view.transform.to_source(n.bbox), n.confidence, n.label)
                })
                .collect();
            Ok(ViewRun {
                detections,
                stage: ViewStage {
                    name: view.name.clone(),
                    transform: view.transform,
                    merge: outcome.stage,
                },
            })
        };

        #[cfg(feature = "parallel")]
        let runs = views.par_iter().map(run_one).collect::<Vec<_>>();
        #[cfg(not(feature = "parallel"))]
        let runs = views.iter().map(run_one).collect::<Vec<_>>();

        runs.into_iter().collect()
    }

    fn describe_input(&self, image: &ImageF32, views: usize) -> InputDescriptor {
        InputDescriptor {
            width: image.w,
            height: image.h,
            channels: image.channels,
            experts: self.experts.len(),
            views,
        }
    }
}

/// Boxes are normalized by the image size, so an image with no pixels or no
/// channels cannot be fused.
fn check_image(image: &ImageF32) -> Result<()> {
    if image.w == 0 || image.h == 0 || image.channels == 0 {
        return Err(FusionError::config(format!(
            "image {}x{}x{} has no samples",
            image.w, image.h, image.channels
        )));
    }
    Ok(())
}
