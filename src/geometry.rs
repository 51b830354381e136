//! Axis-aligned boxes tagged with their coordinate space.
//!
//! Boxes carry a zero-sized marker (`Pixel` or `Normalized`) so that IoU,
//! averaging and suppression can only ever combine boxes living in the same
//! space. Conversions go through [`ImageSize`], which knows the extent of the
//! image the pixel coordinates refer to.

use nalgebra::Vector4;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::marker::PhantomData;

/// Marker trait for box coordinate spaces.
pub trait CoordSpace:
    Copy + Clone + Debug + Default + PartialEq + Send + Sync + 'static
{
    const NAME: &'static str;
}

/// Pixel coordinates of a concrete image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pixel;

/// Unit-square coordinates: x divided by width, y divided by height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalized;

impl CoordSpace for Pixel {
    const NAME: &'static str = "pixel";
}

impl CoordSpace for Normalized {
    const NAME: &'static str = "normalized";
}

/// Axis-aligned box `(x1, y1, x2, y2)` with `x1 < x2`, `y1 < y2`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BBox<S: CoordSpace = Pixel> {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    #[serde(skip)]
    space: PhantomData<S>,
}

impl<S: CoordSpace> BBox<S> {
    /// Construct a box without checking the corner ordering.
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            space: PhantomData,
        }
    }

    /// Construct a box, rejecting non-finite or inverted corners.
    pub fn try_new(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self, String> {
        let b = Self::new(x1, y1, x2, y2);
        b.check()?;
        Ok(b)
    }

    /// Verify the box invariant, returning a human-readable reason on failure.
    pub fn check(&self) -> Result<(), String> {
        if !self.to_array().iter().all(|v| v.is_finite()) {
            return Err(format!("non-finite {} box {:?}", S::NAME, self.to_array()));
        }
        if self.x1 >= self.x2 || self.y1 >= self.y2 {
            return Err(format!("degenerate {} box {:?}", S::NAME, self.to_array()));
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    #[inline]
    pub fn to_array(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    #[inline]
    pub fn as_vector(&self) -> Vector4<f32> {
        Vector4::new(self.x1, self.y1, self.x2, self.y2)
    }

    #[inline]
    pub fn from_vector(v: &Vector4<f32>) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }

    /// Area of the overlap with `other`, zero when the boxes are disjoint.
    pub fn intersection(&self, other: &Self) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);
        (x2 - x1).max(0.0) * (y2 - y1).max(0.0)
    }

    /// Intersection-over-union in `[0, 1]`.
    ///
    /// Returns 0 when the union is empty so degenerate inputs never yield NaN.
    pub fn iou(&self, other: &Self) -> f32 {
        let inter = self.intersection(other);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        (inter / union).clamp(0.0, 1.0)
    }
}

impl BBox<Pixel> {
    /// Map into the unit square of an image of the given size.
    pub fn normalize(&self, size: ImageSize) -> BBox<Normalized> {
        BBox::from_vector(&self.as_vector().component_div(&size.scale_vector()))
    }
}

impl BBox<Normalized> {
    /// Map from the unit square back to pixels of an image of the given size.
    pub fn denormalize(&self, size: ImageSize) -> BBox<Pixel> {
        BBox::from_vector(&self.as_vector().component_mul(&size.scale_vector()))
    }

    /// Mirror across the vertical centre line of the unit square.
    pub fn flip_horizontal(&self) -> Self {
        Self::new(1.0 - self.x2, self.y1, 1.0 - self.x1, self.y2)
    }
}

/// Extent of an image in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: usize,
    pub height: usize,
}

impl ImageSize {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    fn scale_vector(&self) -> Vector4<f32> {
        let (w, h) = (self.width as f32, self.height as f32);
        Vector4::new(w, h, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(x1: f32, y1: f32, x2: f32, y2: f32) -> BBox<Pixel> {
        BBox::new(x1, y1, x2, y2)
    }

    #[test]
    fn iou_of_box_with_itself_is_one() {
        let b = px(3.0, 4.0, 20.0, 17.5);
        assert!((b.iou(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = px(0.0, 0.0, 10.0, 10.0);
        let b = px(10.0, 0.0, 20.0, 10.0);
        let c = px(50.0, 50.0, 60.0, 70.0);
        assert_eq!(a.iou(&b), 0.0);
        assert_eq!(a.iou(&c), 0.0);
    }

    #[test]
    fn iou_stays_in_unit_interval() {
        let boxes = [
            px(0.0, 0.0, 10.0, 10.0),
            px(5.0, 5.0, 15.0, 15.0),
            px(2.0, 2.0, 4.0, 4.0),
            px(-3.0, 1.0, 30.0, 2.0),
            px(9.9, 9.9, 10.1, 10.1),
        ];
        for a in &boxes {
            for b in &boxes {
                let v = a.iou(b);
                assert!((0.0..=1.0).contains(&v), "iou {v} out of range for {a:?} {b:?}");
                assert!((v - b.iou(a)).abs() < 1e-6, "iou must be symmetric");
            }
        }
    }

    #[test]
    fn iou_matches_hand_computation() {
        let a = px(0.0, 0.0, 10.0, 10.0);
        let b = px(5.0, 0.0, 15.0, 10.0);
        // overlap 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_round_trip_preserves_box() {
        let size = ImageSize::new(640, 480);
        let b = px(10.5, 20.25, 600.0, 479.0);
        let back = b.normalize(size).denormalize(size);
        for (orig, got) in b.to_array().iter().zip(back.to_array()) {
            assert!(
                (orig - got).abs() <= 1e-5 * orig.abs().max(1.0),
                "expected {orig}, got {got}"
            );
        }
    }

    #[test]
    fn normalize_divides_by_extent() {
        let n = px(32.0, 24.0, 64.0, 48.0).normalize(ImageSize::new(64, 48));
        assert_eq!(n.to_array(), [0.5, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn flip_horizontal_is_an_involution() {
        let b: BBox<Normalized> = BBox::new(0.1, 0.2, 0.4, 0.9);
        let f = b.flip_horizontal();
        assert!((f.x1 - 0.6).abs() < 1e-6 && (f.x2 - 0.9).abs() < 1e-6);
        let back = f.flip_horizontal();
        for (a, b) in b.to_array().iter().zip(back.to_array()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn check_rejects_inverted_and_nan_boxes() {
        assert!(px(5.0, 0.0, 5.0, 1.0).check().is_err());
        assert!(px(0.0, 3.0, 1.0, 2.0).check().is_err());
        assert!(px(f32::NAN, 0.0, 1.0, 1.0).check().is_err());
        assert!(BBox::<Pixel>::try_new(0.0, 0.0, 1.0, 1.0).is_ok());
    }
}
