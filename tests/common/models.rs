use moe_fusion::image::ImageF32;
use moe_fusion::models::{ExpertDetector, GateWeights, GatingWeightProvider};
use moe_fusion::{BBox, Detection, DetectionSet, FusionError, Pixel, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Reports the bounding box of all pixels brighter than 0.5 in channel 0.
pub struct BlobExpert {
    pub name: String,
    pub confidence: f32,
    pub label: u32,
}

impl BlobExpert {
    pub fn new(name: &str, confidence: f32) -> Self {
        Self {
            name: name.to_string(),
            confidence,
            label: 0,
        }
    }
}

impl ExpertDetector for BlobExpert {
    fn name(&self) -> &str {
        &self.name
    }

    fn infer(&self, image: &ImageF32) -> Result<DetectionSet<Pixel>> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for y in 0..image.h {
            for x in 0..image.w {
                if image.get(x, y, 0) > 0.5 {
                    bounds = Some(match bounds {
                        None => (x, y, x, y),
                        Some((x1, y1, x2, y2)) => (x1.min(x), y1.min(y), x2.max(x), y2.max(y)),
                    });
                }
            }
        }
        Ok(bounds
            .map(|(x1, y1, x2, y2)| {
                Detection::new(
                    BBox::new(x1 as f32, y1 as f32, (x2 + 1) as f32, (y2 + 1) as f32),
                    self.confidence,
                    self.label,
                )
            })
            .into_iter()
            .collect())
    }
}

/// Constant weights that count how often they were queried.
pub struct CountingGate {
    weights: Vec<f32>,
    calls: Arc<AtomicUsize>,
}

impl CountingGate {
    /// The returned counter observes every `infer` call.
    pub fn new(weights: Vec<f32>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                weights,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl GatingWeightProvider for CountingGate {
    fn infer(&self, _image: &ImageF32) -> Result<GateWeights> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        GateWeights::new(self.weights.clone())
    }
}

/// Gate that always fails, standing in for a crashed model server.
pub struct BrokenGate;

impl GatingWeightProvider for BrokenGate {
    fn infer(&self, _image: &ImageF32) -> Result<GateWeights> {
        Err(FusionError::inference("gate", "connection reset"))
    }
}
