//! Raster saving utilities.

use std::fs;
use std::path::{Path, PathBuf};

use image::GrayImage;

use crate::error::{Error, Result};
use crate::pipeline::SegmentationResult;

/// Paths of the rasters written by [`save_rasters`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRasters {
    pub probability: PathBuf,
    pub mask: PathBuf,
    pub skeleton: PathBuf,
}

/// Save the three result rasters as lossless PNG files.
///
/// Files are named `<stem>_probability.png`, `<stem>_mask.png` and
/// `<stem>_skeleton.png` inside `output_dir`, which is created if missing.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a file cannot be
/// written.
pub fn save_rasters<P: AsRef<Path>>(
    result: &SegmentationResult,
    output_dir: P,
    stem: &str,
) -> Result<SavedRasters> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let saved = SavedRasters {
        probability: output_dir.join(format!("{stem}_probability.png")),
        mask: output_dir.join(format!("{stem}_mask.png")),
        skeleton: output_dir.join(format!("{stem}_skeleton.png")),
    };

    save_png(result.probability(), &saved.probability)?;
    save_png(result.mask(), &saved.mask)?;
    save_png(result.skeleton(), &saved.skeleton)?;

    Ok(saved)
}

fn save_png(raster: &GrayImage, path: &Path) -> Result<()> {
    tracing::debug!("Writing {}", path.display());
    raster
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| Error::ImageSave {
            path: path.to_path_buf(),
            source,
        })
}
