//! Image loading utilities.

use std::path::Path;

use image::RgbImage;

use crate::error::{Error, Result};

/// Load an image from disk as 8-bit RGB.
///
/// Alpha and higher bit depths are dropped by the conversion to RGB8.
/// Zero-sized images are rejected here so they never reach preprocessing.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded or has a zero dimension.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    let rgb = img.to_rgb8();
    check_dimensions(&rgb)?;

    tracing::debug!(
        "Loaded {} ({}x{})",
        path.display(),
        rgb.width(),
        rgb.height()
    );

    Ok(rgb)
}

/// Reject images that cannot produce a tensor.
///
/// # Errors
///
/// Returns [`Error::DegenerateInput`] when either dimension is zero.
pub fn check_dimensions(image: &RgbImage) -> Result<()> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::DegenerateInput {
            width,
            height,
            reason: "image has no pixels".to_string(),
        });
    }
    Ok(())
}
