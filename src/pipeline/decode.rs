//! Score decoding: stable two-class softmax, argmax mask, crop.

use ndarray::{s, Array2, Array3, Axis, Zip};

use crate::error::{Error, Result};
use crate::image::{LogitMap, NUM_CLASSES};

/// Mask value for crack pixels.
pub const FOREGROUND: u8 = 255;

/// Mask value for background pixels.
pub const BACKGROUND: u8 = 0;

/// Crack probability and binary mask at the source resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedScores {
    /// Crack-class probability in [0, 1].
    pub probability: Array2<f32>,
    /// [`FOREGROUND`] where crack wins strictly, [`BACKGROUND`] otherwise.
    pub mask: Array2<u8>,
}

/// Two-class softmax with max subtraction.
///
/// Returns `(p_background, p_crack)`; the pair sums to one and stays finite
/// for any finite logits.
#[inline]
#[must_use]
pub fn softmax_pair(l0: f32, l1: f32) -> (f32, f32) {
    let m = l0.max(l1);
    let e0 = (l0 - m).exp();
    let e1 = (l1 - m).exp();
    let p0 = e0 / (e0 + e1);
    (p0, 1.0 - p0)
}

/// Per-pixel class probabilities for the full padded logit map.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] unless the map has exactly two channels.
pub fn class_probabilities(logits: &LogitMap) -> Result<Array3<f32>> {
    check_classes(logits)?;

    let mut probs = Array3::<f32>::zeros(logits.raw_dim());
    let (bg, fg) = probs.multi_slice_mut((s![0, .., ..], s![1, .., ..]));
    Zip::from(bg)
        .and(fg)
        .and(logits.index_axis(Axis(0), 0))
        .and(logits.index_axis(Axis(0), 1))
        .for_each(|p0, p1, &l0, &l1| {
            (*p0, *p1) = softmax_pair(l0, l1);
        });

    Ok(probs)
}

/// Decode padded logits into a cropped probability map and mask.
///
/// `original_height` and `original_width` select the top-left region that
/// corresponds to the source image; the padded border is dropped without
/// resampling.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the logits are not `[2, H, W]` or are
/// smaller than the requested crop.
pub fn decode_logits(
    logits: &LogitMap,
    original_height: usize,
    original_width: usize,
) -> Result<DecodedScores> {
    let probs = class_probabilities(logits)?;
    let (_, height, width) = probs.dim();
    if original_height > height || original_width > width {
        return Err(Error::ShapeMismatch {
            expected: format!("logits covering {original_height}x{original_width}"),
            actual: format!("{height}x{width}"),
        });
    }

    let p0 = probs.slice(s![0, ..original_height, ..original_width]);
    let p1 = probs.slice(s![1, ..original_height, ..original_width]);

    let mask = Zip::from(&p0).and(&p1).map_collect(|&bg, &fg| {
        if fg > bg {
            FOREGROUND
        } else {
            BACKGROUND
        }
    });

    tracing::debug!(
        "Decoded {height}x{width} logits, cropped to {original_height}x{original_width}, \
         {} crack pixels",
        mask.iter().filter(|&&v| v == FOREGROUND).count()
    );

    Ok(DecodedScores {
        probability: p1.to_owned(),
        mask,
    })
}

fn check_classes(logits: &LogitMap) -> Result<()> {
    let classes = logits.len_of(Axis(0));
    if classes != NUM_CLASSES {
        return Err(Error::ShapeMismatch {
            expected: format!("{NUM_CLASSES} logit channels"),
            actual: format!("{classes} channels"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let cases = [
            (0.0, 0.0),
            (1.0, -1.0),
            (-3.5, 2.25),
            (1000.0, -1000.0),
            (-1000.0, 1000.0),
            (88.0, 89.0),
            (-1e30, 1e30),
            (f32::MAX, f32::MIN),
        ];
        for (l0, l1) in cases {
            let (p0, p1) = softmax_pair(l0, l1);
            assert!(p0.is_finite() && p1.is_finite(), "({l0}, {l1})");
            assert!(p0 >= 0.0 && p1 >= 0.0, "({l0}, {l1}) -> ({p0}, {p1})");
            assert!((p0 + p1 - 1.0).abs() < 1e-5, "({l0}, {l1}) -> ({p0}, {p1})");
        }
    }

    #[test]
    fn test_softmax_extremes() {
        assert_eq!(softmax_pair(1000.0, -1000.0), (1.0, 0.0));
        assert_eq!(softmax_pair(-1000.0, 1000.0), (0.0, 1.0));
        assert_eq!(softmax_pair(5.0, 5.0), (0.5, 0.5));
    }

    #[test]
    fn test_class_probabilities_planes() {
        let mut logits = Array3::<f32>::zeros((2, 2, 2));
        logits[[1, 0, 1]] = 2.0;
        logits[[0, 1, 0]] = 3.0;

        let probs = class_probabilities(&logits).unwrap();
        for y in 0..2 {
            for x in 0..2 {
                assert!((probs[[0, y, x]] + probs[[1, y, x]] - 1.0).abs() < 1e-6);
            }
        }
        assert!(probs[[1, 0, 1]] > 0.8);
        assert!(probs[[1, 1, 0]] < 0.1);
        assert_eq!(probs[[1, 0, 0]], 0.5);
    }

    #[test]
    fn test_mask_is_binary_and_ties_are_background() {
        let mut logits = Array3::<f32>::zeros((2, 64, 64));
        for ((c, y, x), v) in logits.indexed_iter_mut() {
            *v = ((c * 7 + y * 13 + x * 5) % 11) as f32 - 5.0;
        }
        let decoded = decode_logits(&logits, 64, 64).unwrap();
        assert!(decoded
            .mask
            .iter()
            .all(|&v| v == FOREGROUND || v == BACKGROUND));

        let ties = Array3::<f32>::from_elem((2, 64, 64), 0.25);
        let decoded = decode_logits(&ties, 10, 10).unwrap();
        assert!(decoded.mask.iter().all(|&v| v == BACKGROUND));
        assert!(decoded.probability.iter().all(|&p| p == 0.5));
    }

    #[test]
    fn test_crop_keeps_top_left_region() {
        let mut logits = Array3::<f32>::zeros((2, 64, 128));
        // Crack everywhere inside the 20x70 source region, background outside.
        for y in 0..64 {
            for x in 0..128 {
                let inside = y < 20 && x < 70;
                logits[[1, y, x]] = if inside { 8.0 } else { -8.0 };
            }
        }

        let decoded = decode_logits(&logits, 20, 70).unwrap();
        assert_eq!(decoded.probability.dim(), (20, 70));
        assert_eq!(decoded.mask.dim(), (20, 70));
        assert!(decoded.mask.iter().all(|&v| v == FOREGROUND));
        assert!(decoded.probability.iter().all(|&p| p > 0.99));
    }

    #[test]
    fn test_wrong_channel_count_rejected() {
        let logits = Array3::<f32>::zeros((3, 64, 64));
        assert!(matches!(
            decode_logits(&logits, 64, 64),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_crop_larger_than_logits_rejected() {
        let logits = Array3::<f32>::zeros((2, 64, 64));
        assert!(matches!(
            decode_logits(&logits, 65, 10),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
