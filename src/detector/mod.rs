//! Mixture-of-experts detector with test-time augmentation.
//!
//! Overview
//! - A gating provider assigns one trust weight per expert for the image.
//! - Every expert's confidences are scaled by its weight and thresholded;
//!   survivors from all experts are pooled and greedy NMS picks the kept set.
//!   This is the single-view merge.
//! - For test-time augmentation the single-view merge runs on the identity
//!   view and on every configured augmentation. Per-view results are mapped
//!   into the unit square of the source frame, fused across views with
//!   weighted box fusion and mapped back to source pixels.
//!
//! Modules
//! - [`params`] – thresholds and mode knobs used by the detector and CLI.
//! - `merger` – the single-view [`WeightedDetectionMerger`].
//! - `pipeline` – the [`MoeDetector`] entry points.
//!
//! Key Ideas
//! - Empty is never an error: experts or views without detections simply
//!   contribute nothing, and an empty pool yields an empty result.
//! - Experts and views are independent and run on rayon's pool when the
//!   `parallel` feature is enabled; results are joined in index order so the
//!   output never depends on scheduling.

mod merger;
pub mod params;
mod pipeline;

pub use merger::{MergeOutcome, WeightedDetectionMerger};
pub use params::{check_thresholds, FusionParams};
pub use pipeline::MoeDetector;
