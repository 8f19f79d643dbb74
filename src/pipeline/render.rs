//! Conversion of numeric maps into 8-bit grayscale rasters.

use image::GrayImage;
use ndarray::Array2;

/// Map a probability grid in [0, 1] to a grayscale raster.
///
/// With `invert` set, `1 - p` is rendered so that confident crack pixels
/// appear dark.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn render_probability(map: &Array2<f32>, invert: bool) -> GrayImage {
    let (height, width) = map.dim();
    // Safe: dimensions come from a u32 image
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        let p = map[[y as usize, x as usize]];
        let p = if invert { 1.0 - p } else { p };
        image::Luma([quantize(p)])
    })
}

/// Map a {0, 255} byte grid to a grayscale raster, optionally as `255 - v`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn render_binary(map: &Array2<u8>, invert: bool) -> GrayImage {
    let (height, width) = map.dim();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        let v = map[[y as usize, x as usize]];
        image::Luma([if invert { 255 - v } else { v }])
    })
}

/// Scale a unit value to a byte, clamping out-of-range input.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quantize(value: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
