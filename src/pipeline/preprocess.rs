//! Tensor preparation: padding, degenerate-pixel substitution, normalization.

use image::RgbImage;
use ndarray::{Array3, Axis};
use rand::Rng;

use crate::error::Result;
use crate::image::{check_dimensions, InputTensor, PAD_MULTIPLE, RGB_CHANNELS};

/// Channels whose standard deviation falls below this are not rescaled.
pub const STD_FLOOR: f64 = 1e-6;

/// Mean and population standard deviation of one tensor channel,
/// measured after substitution and before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    pub mean: f32,
    pub std: f32,
}

/// Normalized model input plus the geometry needed to undo the padding.
#[derive(Debug, Clone)]
pub struct PreparedInput {
    /// Planar `[3, height, width]` tensor.
    pub tensor: InputTensor,
    /// Source image height.
    pub original_height: usize,
    /// Source image width.
    pub original_width: usize,
    /// Number of spatial positions whose all-zero triple was replaced.
    pub substituted: usize,
    /// Per-channel statistics used for normalization, in R, G, B order.
    pub stats: [ChannelStats; RGB_CHANNELS],
}

impl PreparedInput {
    /// Padded height of the tensor.
    #[must_use]
    pub fn height(&self) -> usize {
        self.tensor.len_of(Axis(1))
    }

    /// Padded width of the tensor.
    #[must_use]
    pub fn width(&self) -> usize {
        self.tensor.len_of(Axis(2))
    }
}

/// Round `n` up to the next multiple of [`PAD_MULTIPLE`].
#[must_use]
pub const fn padded_dim(n: usize) -> usize {
    n.div_ceil(PAD_MULTIPLE) * PAD_MULTIPLE
}

/// Convert an RGB image into a normalized, padded planar tensor.
///
/// 1. Pads height and width up to multiples of 64 with zeros (right/bottom).
/// 2. Copies raw byte values, unscaled, into the planar layout.
/// 3. Replaces every all-zero RGB triple, padding included, with independent
///    uniform samples from `rng`.
/// 4. Normalizes each channel to zero mean and unit population variance;
///    near-constant channels keep a divisor of 1.
///
/// # Errors
///
/// Returns [`crate::Error::DegenerateInput`] for zero-sized images.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn prepare_tensor<R: Rng + ?Sized>(image: &RgbImage, rng: &mut R) -> Result<PreparedInput> {
    check_dimensions(image)?;

    let original_width = image.width() as usize;
    let original_height = image.height() as usize;
    let height = padded_dim(original_height);
    let width = padded_dim(original_width);

    let mut tensor = Array3::<f32>::zeros((RGB_CHANNELS, height, width));
    for (x, y, pixel) in image.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..RGB_CHANNELS {
            tensor[[c, y, x]] = f32::from(pixel[c]);
        }
    }

    let substituted = substitute_zero_pixels(&mut tensor, rng);

    let mut stats = [ChannelStats { mean: 0.0, std: 1.0 }; RGB_CHANNELS];
    for (c, mut plane) in tensor.axis_iter_mut(Axis(0)).enumerate() {
        let count = plane.len() as f64;
        let mean = plane.iter().map(|&v| f64::from(v)).sum::<f64>() / count;
        let variance = plane
            .iter()
            .map(|&v| {
                let d = f64::from(v) - mean;
                d * d
            })
            .sum::<f64>()
            / count;
        let mut std = variance.sqrt();
        if std < STD_FLOOR {
            std = 1.0;
        }

        let (mean, std) = (mean as f32, std as f32);
        plane.mapv_inplace(|v| (v - mean) / std);
        stats[c] = ChannelStats { mean, std };
    }

    tracing::debug!(
        "Prepared tensor {height}x{width} from {original_height}x{original_width}, \
         {substituted} zero pixels substituted, stats {stats:?}"
    );

    Ok(PreparedInput {
        tensor,
        original_height,
        original_width,
        substituted,
        stats,
    })
}

/// Replace all-zero channel triples with uniform samples in [0, 1).
fn substitute_zero_pixels<R: Rng + ?Sized>(tensor: &mut InputTensor, rng: &mut R) -> usize {
    let (_, height, width) = tensor.dim();
    let mut substituted = 0;

    for y in 0..height {
        for x in 0..width {
            if (0..RGB_CHANNELS).all(|c| tensor[[c, y, x]] == 0.0) {
                for c in 0..RGB_CHANNELS {
                    tensor[[c, y, x]] = rng.random::<f32>();
                }
                substituted += 1;
            }
        }
    }

    substituted
}
