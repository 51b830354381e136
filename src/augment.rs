//! Test-time augmentation views.
//!
//! The generator always yields the identity view first, followed by the
//! configured menu in order. Every view records the geometric transform it
//! applied, so detections found on the view can be mapped back to the frame
//! of the source image. Photometric augmentations (brightness, contrast) leave
//! geometry untouched.
//!
//! Generation is pure: the same source image and menu always produce the same
//! views with the same names.
use crate::error::{FusionError, Result};
use crate::geometry::{BBox, Normalized};
use crate::image::ImageF32;
use serde::{Deserialize, Serialize};

/// One entry of the augmentation menu.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Augmentation {
    /// Mirror the image left/right.
    HorizontalFlip,
    /// Add `delta` to every sample, clamped to `[0, 1]`.
    Brightness { delta: f32 },
    /// Scale samples around the image mean by `factor`, clamped to `[0, 1]`.
    Contrast { factor: f32 },
}

impl Augmentation {
    fn name(&self) -> String {
        match self {
            Self::HorizontalFlip => "hflip".to_string(),
            Self::Brightness { delta } => format!("brightness{delta:+.2}"),
            Self::Contrast { factor } => format!("contrast_x{factor:.2}"),
        }
    }

    fn transform(&self) -> ViewTransform {
        match self {
            Self::HorizontalFlip => ViewTransform::HorizontalFlip,
            Self::Brightness { .. } | Self::Contrast { .. } => ViewTransform::Identity,
        }
    }

    fn check(&self) -> Result<()> {
        match *self {
            Self::HorizontalFlip => Ok(()),
            Self::Brightness { delta } if delta.is_finite() => Ok(()),
            Self::Contrast { factor } if factor.is_finite() && factor > 0.0 => Ok(()),
            other => Err(FusionError::config(format!(
                "invalid augmentation parameters: {other:?}"
            ))),
        }
    }

    fn apply(&self, image: &ImageF32) -> ImageF32 {
        match *self {
            Self::HorizontalFlip => image.flipped_horizontal(),
            Self::Brightness { delta } => image.map_samples(|v| (v + delta).clamp(0.0, 1.0)),
            Self::Contrast { factor } => {
                let mean = image.mean();
                image.map_samples(|v| ((v - mean) * factor + mean).clamp(0.0, 1.0))
            }
        }
    }
}

/// Geometric effect of a view relative to the source image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewTransform {
    #[default]
    Identity,
    HorizontalFlip,
}

impl ViewTransform {
    /// Map a unit-square box found on the view back into the source frame.
    pub fn to_source(&self, bbox: BBox<Normalized>) -> BBox<Normalized> {
        match self {
            Self::Identity => bbox,
            Self::HorizontalFlip => bbox.flip_horizontal(),
        }
    }
}

/// A named augmented rendition of the source image.
#[derive(Clone, Debug)]
pub struct View {
    pub name: String,
    pub image: ImageF32,
    pub transform: ViewTransform,
}

/// Produces the identity view plus a fixed menu of augmentations.
#[derive(Clone, Debug)]
pub struct AugmentationGenerator {
    menu: Vec<Augmentation>,
}

impl Default for AugmentationGenerator {
    fn default() -> Self {
        Self {
            menu: default_menu(),
        }
    }
}

/// Horizontal flip, a brightness lift and a contrast boost.
pub fn default_menu() -> Vec<Augmentation> {
    vec![
        Augmentation::HorizontalFlip,
        Augmentation::Brightness { delta: 0.1 },
        Augmentation::Contrast { factor: 1.2 },
    ]
}

impl AugmentationGenerator {
    pub fn new(menu: Vec<Augmentation>) -> Result<Self> {
        for aug in &menu {
            aug.check()?;
        }
        Ok(Self { menu })
    }

    /// Generator that only yields the identity view.
    pub fn identity_only() -> Self {
        Self { menu: Vec::new() }
    }

    pub fn menu(&self) -> &[Augmentation] {
        &self.menu
    }

    /// Number of views `generate` yields, identity included.
    pub fn view_count(&self) -> usize {
        self.menu.len() + 1
    }

    /// Lazily produce the views in order; each call restarts from identity.
    pub fn views<'a>(&'a self, image: &'a ImageF32) -> impl Iterator<Item = View> + 'a {
        let identity = View {
            name: "identity".to_string(),
            image: image.clone(),
            transform: ViewTransform::Identity,
        };
        std::iter::once(identity).chain(self.menu.iter().map(move |aug| View {
            name: aug.name(),
            image: aug.apply(image),
            transform: aug.transform(),
        }))
    }

    pub fn generate(&self, image: &ImageF32) -> Vec<View> {
        self.views(image).collect()
    }
}
