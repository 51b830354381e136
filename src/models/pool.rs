use super::ExpertDetector;
use crate::error::{FusionError, Result};
use crate::geometry::Pixel;
use crate::image::ImageF32;
use crate::types::DetectionSet;

/// The set of experts consulted for every view.
///
/// Construction fails on an empty list, so a pool always has at least one
/// expert. `infer` validates every detection an expert returns.
pub struct ExpertPool {
    experts: Vec<Box<dyn ExpertDetector>>,
}

impl ExpertPool {
    pub fn new(experts: Vec<Box<dyn ExpertDetector>>) -> Result<Self> {
        if experts.is_empty() {
            return Err(FusionError::config("expert pool is empty"));
        }
        Ok(Self { experts })
    }

    pub fn len(&self) -> usize {
        self.experts.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.experts.is_empty()
    }

    pub fn name(&self, expert: usize) -> Option<&str> {
        self.experts.get(expert).map(|e| e.name())
    }

    /// Run expert `expert` on `image` and check its output.
    pub fn infer(&self, expert: usize, image: &ImageF32) -> Result<DetectionSet<Pixel>> {
        let detector = self.experts.get(expert).ok_or_else(|| {
            FusionError::config(format!(
                "expert index {expert} out of range for pool of {}",
                self.experts.len()
            ))
        })?;
        let detections = detector.infer(image)?;
        for det in &detections {
            det.validate(detector.name())?;
        }
        Ok(detections)
    }
}

impl std::fmt::Debug for ExpertPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.experts.iter().map(|e| e.name()).collect();
        f.debug_struct("ExpertPool").field("experts", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;
    use crate::models::FixedExpert;
    use crate::types::Detection;

    fn image() -> ImageF32 {
        ImageF32::new(8, 8, 3)
    }

    #[test]
    fn empty_pool_is_a_configuration_error() {
        assert!(matches!(
            ExpertPool::new(Vec::new()),
            Err(FusionError::Configuration(_))
        ));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let pool = ExpertPool::new(vec![Box::new(FixedExpert::empty("a"))]).unwrap();
        assert!(matches!(
            pool.infer(1, &image()),
            Err(FusionError::Configuration(_))
        ));
    }

    #[test]
    fn malformed_expert_output_is_rejected_at_the_boundary() {
        let bad = Detection::new(BBox::new(5.0, 5.0, 1.0, 9.0), 0.9, 0);
        let pool = ExpertPool::new(vec![Box::new(FixedExpert::new("broken", vec![bad]))]).unwrap();
        match pool.infer(0, &image()) {
            Err(FusionError::MalformedDetection { source_name, .. }) => {
                assert_eq!(source_name, "broken")
            }
            other => panic!("expected malformed detection, got {other:?}"),
        }
    }

    #[test]
    fn empty_expert_output_is_not_an_error() {
        let pool = ExpertPool::new(vec![Box::new(FixedExpert::empty("quiet"))]).unwrap();
        assert!(pool.infer(0, &image()).unwrap().is_empty());
    }
}
