//! Diagnostics data model returned next to the fused detections.
//!
//! `FusionReport` is the entry point: the final detections plus a
//! `FusionTrace` recording what each view, each expert and the box fusion
//! stage did. Everything serializes to camelCase JSON for the demo tool.

pub mod pipeline;
pub mod stages;
pub mod timing;

pub use pipeline::{FusionReport, FusionTrace, InputDescriptor, Thresholds};
pub use stages::{ExpertStage, MergeStage, ViewStage, WbfStage};
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
