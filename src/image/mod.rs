//! Image loading, tensor layout, and raster saving utilities.

mod load;
mod save;

pub use load::{check_dimensions, load_image};
pub use save::{save_rasters, SavedRasters};

use ndarray::Array3;

/// Model input in planar CHW format (channels, height, width).
/// Channel order is R, G, B.
pub type InputTensor = Array3<f32>;

/// Raw model scores in planar CHW format, channel 0 = background, 1 = crack.
pub type LogitMap = Array3<f32>;

/// Padded tensor dimensions are multiples of this value.
pub const PAD_MULTIPLE: usize = 64;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

/// Number of classes emitted by the segmentation model.
pub const NUM_CLASSES: usize = 2;
