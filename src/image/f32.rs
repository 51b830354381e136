//! Owned interleaved f32 image in row-major layout (stride == width * channels).
//!
//! Sample values are nominally in `[0, 1]`. This is the in-memory handle the
//! fusion pipeline passes to the gating provider and the experts; augmented
//! views are new `ImageF32` values, never files.
use super::traits::ImageView;

#[derive(Clone, Debug, PartialEq)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Interleaved samples per pixel (1 = gray, 3 = RGB)
    pub channels: usize,
    /// Number of f32 elements between consecutive rows (equals `w * channels`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h × channels`.
    pub fn new(w: usize, h: usize, channels: usize) -> Self {
        Self::filled(w, h, channels, 0.0)
    }

    /// Construct a buffer where every sample equals `value`.
    pub fn filled(w: usize, h: usize, channels: usize, value: f32) -> Self {
        let stride = w * channels;
        Self {
            w,
            h,
            channels,
            stride,
            data: vec![value; stride * h],
        }
    }

    /// Wrap existing interleaved samples. Returns `None` on a length mismatch.
    pub fn from_raw(w: usize, h: usize, channels: usize, data: Vec<f32>) -> Option<Self> {
        let stride = w * channels;
        (data.len() == stride * h).then_some(Self {
            w,
            h,
            channels,
            stride,
            data,
        })
    }

    #[inline]
    /// Convert (x, y, c) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize, c: usize) -> usize {
        y * self.stride + x * self.channels + c
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> f32 {
        self.data[self.idx(x, y, c)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, c: usize, v: f32) {
        let i = self.idx(x, y, c);
        self.data[i] = v;
    }

    /// Mean over all samples, 0 for an empty image.
    pub fn mean(&self) -> f32 {
        let count = self.w * self.h * self.channels;
        if count == 0 {
            return 0.0;
        }
        let sum: f64 = self.rows().flatten().map(|&v| v as f64).sum();
        (sum / count as f64) as f32
    }

    /// New image with every sample passed through `f`.
    pub fn map_samples(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            data: self.data.iter().map(|&v| f(v)).collect(),
            ..self.clone_header()
        }
    }

    /// New image mirrored left/right.
    pub fn flipped_horizontal(&self) -> Self {
        let mut out = Self::new(self.w, self.h, self.channels);
        let c = self.channels;
        if c == 0 {
            return out;
        }
        for y in 0..self.h {
            let src = self.row(y);
            let start = y * out.stride;
            let dst = &mut out.data[start..start + out.stride];
            for (x, px) in src.chunks_exact(c).enumerate() {
                let tx = self.w - 1 - x;
                dst[tx * c..tx * c + c].copy_from_slice(px);
            }
        }
        out
    }

    fn clone_header(&self) -> Self {
        Self {
            w: self.w,
            h: self.h,
            channels: self.channels,
            stride: self.stride,
            data: Vec::new(),
        }
    }
}

impl ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn channels(&self) -> usize {
        self.channels
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.w * self.channels]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_mirrors_pixels_and_keeps_channels_together() {
        let data = vec![
            0.0, 0.1, 0.2, 0.3, 0.4, 0.5, // row 0: px0, px1
            0.6, 0.7, 0.8, 0.9, 1.0, 0.0, // row 1
        ];
        let img = ImageF32::from_raw(2, 2, 3, data).expect("valid buffer");
        let flipped = img.flipped_horizontal();
        assert_eq!(flipped.row(0), &[0.3, 0.4, 0.5, 0.0, 0.1, 0.2]);
        assert_eq!(flipped.row(1), &[0.9, 1.0, 0.0, 0.6, 0.7, 0.8]);
        assert_eq!(flipped.flipped_horizontal(), img);
    }

    #[test]
    fn from_raw_rejects_length_mismatch() {
        assert!(ImageF32::from_raw(4, 4, 3, vec![0.0; 47]).is_none());
    }

    #[test]
    fn mean_and_map_samples() {
        let img = ImageF32::filled(3, 2, 1, 0.25);
        assert!((img.mean() - 0.25).abs() < 1e-6);
        let brighter = img.map_samples(|v| v + 0.5);
        assert!((brighter.mean() - 0.75).abs() < 1e-6);
        assert_eq!(brighter.rows().count(), 2);
    }

    #[test]
    fn zero_channel_image_flips_and_averages_without_panicking() {
        let img = ImageF32::new(3, 2, 0);
        assert_eq!(img.flipped_horizontal(), img);
        assert_eq!(img.mean(), 0.0);
    }
}
