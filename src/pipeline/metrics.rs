//! Crack measurements derived from the mask and its skeleton.

use image::Luma;
use imageproc::region_labelling::{connected_components, Connectivity};
use ndarray::Array2;

use super::render::render_binary;

/// Summary measurements of the detected cracks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CrackMetrics {
    /// Mask pixels classified as crack.
    pub crack_area: usize,
    /// Skeleton pixels, an estimate of total crack length in pixels.
    pub skeleton_length: usize,
    /// 8-connected pieces of the skeleton.
    pub segments: usize,
    /// Fraction of the image covered by crack pixels.
    pub coverage: f32,
}

impl CrackMetrics {
    /// Measure a non-inverted mask and skeleton of the same size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn measure(mask: &Array2<u8>, skeleton: &Array2<u8>) -> Self {
        let crack_area = count_foreground(mask);
        let coverage = if mask.is_empty() {
            0.0
        } else {
            crack_area as f32 / mask.len() as f32
        };

        Self {
            crack_area,
            skeleton_length: count_foreground(skeleton),
            segments: count_components(skeleton),
            coverage,
        }
    }
}

fn count_foreground(map: &Array2<u8>) -> usize {
    map.iter().filter(|&&v| v != 0).count()
}

/// Number of 8-connected foreground components in a binary map.
#[must_use]
pub fn count_components(map: &Array2<u8>) -> usize {
    if map.is_empty() {
        return 0;
    }
    // Labelling groups equal values, so collapse every foreground value to one.
    let binary = map.mapv(|v| if v == 0 { 0 } else { u8::MAX });
    let gray = render_binary(&binary, false);
    let labels = connected_components(&gray, Connectivity::Eight, Luma([0u8]));
    labels.pixels().map(|p| p[0]).max().unwrap_or(0) as usize
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_count_components_uses_8_connectivity() {
        let diagonal = array![[255u8, 0, 0], [0, 255, 0], [0, 0, 255]];
        assert_eq!(count_components(&diagonal), 1);

        let split = array![[255u8, 0, 255], [0, 0, 0], [255, 0, 0]];
        assert_eq!(count_components(&split), 3);

        let mixed = array![[1u8, 255], [0, 7]];
        assert_eq!(count_components(&mixed), 1);

        assert_eq!(count_components(&Array2::<u8>::zeros((4, 4))), 0);
        assert_eq!(count_components(&Array2::<u8>::zeros((0, 0))), 0);
    }

    #[test]
    fn test_measure() {
        let mask = array![[255u8, 255, 0, 0], [255, 255, 0, 255]];
        let skeleton = array![[255u8, 0, 0, 0], [0, 0, 0, 255]];

        let metrics = CrackMetrics::measure(&mask, &skeleton);
        assert_eq!(metrics.crack_area, 5);
        assert_eq!(metrics.skeleton_length, 2);
        assert_eq!(metrics.segments, 2);
        assert!((metrics.coverage - 0.625).abs() < 1e-6);
    }
}
