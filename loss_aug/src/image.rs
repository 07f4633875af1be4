use ndarray::{Array3, ArrayView3, ArrayViewMut3};

use crate::{
    error::{LossErr, Result},
    loss::LossKind,
};

/// An RGB image laid out as `(height, width, channel)` with values in `[0, 1]`.
pub type RgbImage = Array3<f32>;

/// The `(width, height)` of an image.
pub type ImageShape = (usize, usize);

/// The amount of channels of an `RgbImage`.
pub const CHANNELS: usize = 3;

/// The representation being optimized.
pub trait Image {
    /// Returns the intrinsic `(width, height)` of the representation.
    fn image_shape(&self) -> ImageShape;

    /// Overwrites the representation so it renders as `image`.
    fn encode_image(&mut self, image: &RgbImage) -> Result<()>;

    /// Renders the representation.
    fn decode_image(&self) -> RgbImage;

    /// The reconstruction loss this representation is best optimized with.
    fn preferred_loss(&self) -> LossKind {
        LossKind::Mse
    }
}

/// Returns the `(width, height)` of `image`.
pub fn shape_of(image: ArrayView3<f32>) -> ImageShape {
    let (h, w, _) = image.dim();
    (w, h)
}

/// Checks that `image` has `CHANNELS` channels and at least one pixel.
///
/// # Errors
/// `LossErr::InvalidImage` naming `what` otherwise.
pub fn check_rgb(what: &'static str, image: ArrayView3<f32>) -> Result<()> {
    let (h, w, c) = image.dim();
    if h == 0 || w == 0 || c != CHANNELS {
        return Err(LossErr::InvalidImage {
            what,
            dim: (h, w, c),
        });
    }

    Ok(())
}

/// Resizes `image` to `shape` using nearest neighbour sampling.
///
/// Returns an owned copy when the shape already matches. `image` must not be empty unless
/// `shape` is, see `check_rgb`.
pub fn resize_nearest(image: ArrayView3<f32>, shape: ImageShape) -> RgbImage {
    let (src_h, src_w, channels) = image.dim();
    let (dst_w, dst_h) = shape;

    if (src_w, src_h) == shape {
        return image.to_owned();
    }

    Array3::from_shape_fn((dst_h, dst_w, channels), |(y, x, c)| {
        let sy = (y * src_h / dst_h.max(1)).min(src_h.saturating_sub(1));
        let sx = (x * src_w / dst_w.max(1)).min(src_w.saturating_sub(1));
        image[[sy, sx, c]]
    })
}

/// A raw pixel buffer, the simplest `Image`.
#[derive(Debug, Clone)]
pub struct PixelImage {
    pixels: RgbImage,
}

impl PixelImage {
    /// Creates a black `PixelImage`.
    ///
    /// # Arguments
    /// * `width` - The width in pixels.
    /// * `height` - The height in pixels.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: Array3::zeros((height, width, CHANNELS)),
        }
    }

    pub fn pixels(&self) -> ArrayView3<'_, f32> {
        self.pixels.view()
    }

    /// Mutable access for the optimizer.
    pub fn pixels_mut(&mut self) -> ArrayViewMut3<'_, f32> {
        self.pixels.view_mut()
    }
}

impl Image for PixelImage {
    fn image_shape(&self) -> ImageShape {
        shape_of(self.pixels.view())
    }

    fn encode_image(&mut self, image: &RgbImage) -> Result<()> {
        check_rgb("encoded image", image.view())?;
        let resized = resize_nearest(image.view(), self.image_shape());
        self.pixels = resized.mapv(|v| v.clamp(0.0, 1.0));
        Ok(())
    }

    fn decode_image(&self) -> RgbImage {
        self.pixels.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_nearest_picks_source_pixels() {
        let src = Array3::from_shape_fn((2, 2, CHANNELS), |(y, x, _)| (y * 2 + x) as f32);
        let dst = resize_nearest(src.view(), (4, 4));

        assert_eq!(shape_of(dst.view()), (4, 4));
        assert_eq!(dst[[0, 0, 0]], 0.0);
        assert_eq!(dst[[0, 3, 1]], 1.0);
        assert_eq!(dst[[3, 0, 2]], 2.0);
        assert_eq!(dst[[3, 3, 0]], 3.0);
    }

    #[test]
    fn encode_resizes_and_clamps() {
        let mut img = PixelImage::new(3, 2);
        let src = Array3::from_elem((4, 6, CHANNELS), 1.5);
        img.encode_image(&src).unwrap();

        assert_eq!(img.image_shape(), (3, 2));
        assert!(img.decode_image().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn encode_rejects_non_rgb_images() {
        let mut img = PixelImage::new(3, 2);

        for src in [Array3::zeros((0, 0, CHANNELS)), Array3::zeros((4, 4, 1))] {
            let err = img.encode_image(&src).unwrap_err();
            assert!(matches!(err, LossErr::InvalidImage { .. }));
        }
        assert_eq!(img.image_shape(), (3, 2));
    }
}
