use crate::error::{FusionError, Result};
use crate::geometry::{BBox, CoordSpace, ImageSize, Normalized, Pixel};
use serde::{Deserialize, Serialize};

/// Class identifier reported by the detectors.
pub type Label = u32;

/// One detected object: a box, a confidence in `[0, 1]` and a class label.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection<S: CoordSpace = Pixel> {
    #[serde(rename = "box")]
    pub bbox: BBox<S>,
    pub confidence: f32,
    pub label: Label,
}

/// Ordered collection of detections. Empty is a valid terminal state.
pub type DetectionSet<S = Pixel> = Vec<Detection<S>>;

impl<S: CoordSpace> Detection<S> {
    pub fn new(bbox: BBox<S>, confidence: f32, label: Label) -> Self {
        Self {
            bbox,
            confidence,
            label,
        }
    }

    /// Copy of this detection with a different confidence.
    pub fn with_confidence(&self, confidence: f32) -> Self {
        Self {
            confidence,
            ..*self
        }
    }

    /// Check box ordering and the confidence range; `source` names the
    /// collaborator in the error.
    pub fn validate(&self, source: &str) -> Result<()> {
        self.bbox
            .check()
            .map_err(|reason| FusionError::MalformedDetection {
                source_name: source.to_string(),
                reason,
            })?;
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(FusionError::MalformedDetection {
                source_name: source.to_string(),
                reason: format!("confidence {} outside [0, 1]", self.confidence),
            });
        }
        Ok(())
    }
}

impl Detection<Pixel> {
    pub fn normalize(&self, size: ImageSize) -> Detection<Normalized> {
        Detection::new(self.bbox.normalize(size), self.confidence, self.label)
    }
}

impl Detection<Normalized> {
    pub fn denormalize(&self, size: ImageSize) -> Detection<Pixel> {
        Detection::new(self.bbox.denormalize(size), self.confidence, self.label)
    }
}
