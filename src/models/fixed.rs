//! Constant model implementations.
//!
//! `FixedGate` always returns the same weights and `FixedExpert` always
//! returns the same detections, whatever image they receive. They stand in
//! for real networks in the demo tool (driven from a JSON config) and in
//! tests.
use super::{ExpertDetector, GateWeights, GatingWeightProvider};
use crate::error::Result;
use crate::geometry::Pixel;
use crate::image::ImageF32;
use crate::types::{Detection, DetectionSet};
use serde::Deserialize;

#[derive(Clone, Debug)]
pub struct FixedGate {
    weights: GateWeights,
}

impl FixedGate {
    pub fn new(weights: GateWeights) -> Self {
        Self { weights }
    }
}

impl GatingWeightProvider for FixedGate {
    fn infer(&self, _image: &ImageF32) -> Result<GateWeights> {
        Ok(self.weights.clone())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FixedExpert {
    name: String,
    #[serde(default)]
    detections: Vec<Detection<Pixel>>,
}

impl FixedExpert {
    pub fn new(name: impl Into<String>, detections: Vec<Detection<Pixel>>) -> Self {
        Self {
            name: name.into(),
            detections,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }
}

impl ExpertDetector for FixedExpert {
    fn name(&self) -> &str {
        &self.name
    }

    fn infer(&self, _image: &ImageF32) -> Result<DetectionSet<Pixel>> {
        Ok(self.detections.clone())
    }
}
