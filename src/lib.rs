//! # `crackseg`
//!
//! Pixel-level pipeline around a binary crack/background segmentation model.
//!
//! A photograph is padded to multiples of 64, stripped of degenerate all-zero
//! pixels and normalized per channel into a planar `[3, H, W]` tensor. The
//! model's `[2, H, W]` logits are decoded with a stable softmax into a crack
//! probability map and an argmax mask, both cropped back to the source size.
//! The mask is then reduced to a 1-pixel-wide centerline with Zhang-Suen
//! thinning, and all three maps are rendered as grayscale rasters.
//!
//! ## Example
//!
//! ```no_run
//! use crackseg::{Config, Pipeline};
//!
//! # fn main() -> crackseg::Result<()> {
//! let config = Config::default();
//! let mut pipeline = Pipeline::new(config)?;
//!
//! let result = pipeline.process("wall.jpg", "out/")?;
//! println!("skeleton length: {} px", result.metrics().skeleton_length);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;

pub use error::{Error, Result};
pub use model::{OnnxSegmenter, SegmentationModel};
pub use pipeline::{spawn_segment, Config, CrackMetrics, Pipeline, SegmentationResult};
