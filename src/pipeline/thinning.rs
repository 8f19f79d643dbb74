//! Zhang-Suen thinning of binary masks.
//!
//! Each iteration runs two sub-passes. A sub-pass evaluates every interior
//! foreground pixel against the mask as it was when the sub-pass started,
//! collects the pixels to delete, and only then clears them. Iterations stop
//! after the first one that deletes nothing.
//!
//! Pixels on the first/last row and column are never candidates for removal
//! and keep their input value, but read as background when they appear as
//! the neighbour of an interior pixel.

use ndarray::Array2;

use super::decode::{BACKGROUND, FOREGROUND};

/// Outcome counters of a thinning run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThinningStats {
    /// Full iterations run, including the final one that removed nothing.
    pub iterations: usize,
    /// Total pixels removed.
    pub removed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubPass {
    First,
    Second,
}

/// Thin a binary mask to a 1-pixel-wide skeleton.
///
/// Any non-zero input value counts as foreground. The output uses
/// [`FOREGROUND`] and [`BACKGROUND`].
#[must_use]
pub fn thin(mask: &Array2<u8>) -> Array2<u8> {
    thin_with_stats(mask).0
}

/// Like [`thin`], also reporting how much work was done.
#[must_use]
pub fn thin_with_stats(mask: &Array2<u8>) -> (Array2<u8>, ThinningStats) {
    let mut grid = mask.mapv(|v| u8::from(v != 0));
    let mut stats = ThinningStats::default();
    let mut marked = Vec::new();

    let (height, width) = grid.dim();
    if height >= 3 && width >= 3 {
        loop {
            stats.iterations += 1;
            let removed = run_sub_pass(&mut grid, SubPass::First, &mut marked)
                + run_sub_pass(&mut grid, SubPass::Second, &mut marked);
            stats.removed += removed;
            if removed == 0 {
                break;
            }
        }
    }

    tracing::debug!(
        "Thinning finished after {} iterations, {} pixels removed",
        stats.iterations,
        stats.removed
    );

    let skeleton = grid.mapv(|v| if v == 0 { BACKGROUND } else { FOREGROUND });
    (skeleton, stats)
}

/// Mark removable pixels against the current state, then clear them together.
///
/// `grid` holds 0/1 values and is at least 3x3.
fn run_sub_pass(grid: &mut Array2<u8>, pass: SubPass, marked: &mut Vec<(usize, usize)>) -> usize {
    let (height, width) = grid.dim();
    marked.clear();

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            if grid[[y, x]] != 0 && is_removable(&neighbours(grid, y, x), pass) {
                marked.push((y, x));
            }
        }
    }

    for &(y, x) in marked.iter() {
        grid[[y, x]] = 0;
    }

    marked.len()
}

/// The 8 neighbours of an interior pixel, clockwise from north:
/// N, NE, E, SE, S, SW, W, NW. Border positions read as 0.
#[inline]
fn neighbours(grid: &Array2<u8>, y: usize, x: usize) -> [u8; 8] {
    let (height, width) = grid.dim();
    let at = |yy: usize, xx: usize| {
        if yy == 0 || xx == 0 || yy == height - 1 || xx == width - 1 {
            0
        } else {
            grid[[yy, xx]]
        }
    };
    [
        at(y - 1, x),
        at(y - 1, x + 1),
        at(y, x + 1),
        at(y + 1, x + 1),
        at(y + 1, x),
        at(y + 1, x - 1),
        at(y, x - 1),
        at(y - 1, x - 1),
    ]
}

#[inline]
fn is_removable(p: &[u8; 8], pass: SubPass) -> bool {
    let occupied: u8 = p.iter().sum();
    if !(2..=6).contains(&occupied) {
        return false;
    }

    let transitions = (0..8).filter(|&i| p[i] == 0 && p[(i + 1) % 8] == 1).count();
    if transitions != 1 {
        return false;
    }

    let [n, _, e, _, s, _, w, _] = *p;
    match pass {
        SubPass::First => n * e * s == 0 && e * s * w == 0,
        SubPass::Second => n * e * w == 0 && n * s * w == 0,
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::pipeline::metrics::count_components;

    fn mask_from_fn(height: usize, width: usize, f: impl Fn(usize, usize) -> bool) -> Array2<u8> {
        Array2::from_shape_fn((height, width), |(y, x)| {
            if f(y, x) {
                FOREGROUND
            } else {
                BACKGROUND
            }
        })
    }

    fn foreground(mask: &Array2<u8>) -> Vec<(usize, usize)> {
        mask.indexed_iter()
            .filter(|&(_, &v)| v != 0)
            .map(|(idx, _)| idx)
            .collect()
    }

    fn has_2x2_block(mask: &Array2<u8>) -> bool {
        let (h, w) = mask.dim();
        (0..h.saturating_sub(1)).any(|y| {
            (0..w.saturating_sub(1)).any(|x| {
                mask[[y, x]] != 0
                    && mask[[y + 1, x]] != 0
                    && mask[[y, x + 1]] != 0
                    && mask[[y + 1, x + 1]] != 0
            })
        })
    }

    #[test]
    fn test_filled_rectangle_collapses_to_line() {
        let mask = mask_from_fn(12, 30, |y, x| (3..9).contains(&y) && (3..27).contains(&x));
        let skeleton = thin(&mask);

        let expected: Vec<_> = (6..24).map(|x| (5, x)).collect();
        assert_eq!(foreground(&skeleton), expected);
        assert_eq!(count_components(&skeleton), 1);
        assert_eq!(count_components(&mask), 1);
    }

    #[test]
    fn test_wide_diagonal_thins_to_centerline() {
        let mask = mask_from_fn(32, 32, |y, x| {
            x.abs_diff(y) <= 2 && (4..=27).contains(&x) && (4..=27).contains(&y)
        });
        let skeleton = thin(&mask);

        let expected: Vec<_> = (5..=25).map(|i| (i, i)).collect();
        assert_eq!(foreground(&skeleton), expected);
        assert_eq!(count_components(&skeleton), 1);
        assert!(!has_2x2_block(&skeleton));
    }

    #[test]
    fn test_removals_apply_after_whole_sub_pass() {
        // Clearing pixels during the scan would keep the lower row instead.
        let mask = mask_from_fn(8, 12, |y, x| (y == 3 || y == 4) && (2..10).contains(&x));
        let skeleton = thin(&mask);

        let expected: Vec<_> = (3..=8).map(|x| (3, x)).collect();
        assert_eq!(foreground(&skeleton), expected);
    }

    #[test]
    fn test_thinning_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut masks = vec![
            mask_from_fn(12, 30, |y, x| (3..9).contains(&y) && (3..27).contains(&x)),
            mask_from_fn(20, 20, |y, x| (y as isize - 10).pow(2) + (x as isize - 10).pow(2) < 50),
        ];
        for _ in 0..8 {
            masks.push(Array2::from_shape_fn((24, 24), |_| {
                if rng.random_bool(0.55) {
                    FOREGROUND
                } else {
                    BACKGROUND
                }
            }));
        }

        for mask in masks {
            let once = thin(&mask);
            let twice = thin(&once);
            assert_eq!(once, twice);
            assert!(once.iter().all(|&v| v == FOREGROUND || v == BACKGROUND));
        }
    }

    #[test]
    fn test_skeleton_is_subset_of_mask() {
        let mut rng = StdRng::seed_from_u64(5);
        let mask = Array2::from_shape_fn((40, 40), |_| if rng.random_bool(0.6) { 1 } else { 0 });
        let skeleton = thin(&mask);
        for ((y, x), &v) in skeleton.indexed_iter() {
            if v != 0 {
                assert_ne!(mask[[y, x]], 0);
            }
        }
    }

    #[test]
    fn test_border_pixels_are_kept_but_read_as_background() {
        let mask = Array2::from_elem((5, 5), FOREGROUND);
        let skeleton = thin(&mask);

        // (1,1) only sees E, SE and S once the frame reads as background.
        assert_eq!(skeleton[[1, 1]], BACKGROUND);
        let ring_and_center = mask_from_fn(5, 5, |y, x| {
            y == 0 || x == 0 || y == 4 || x == 4 || (y, x) == (2, 2)
        });
        assert_eq!(skeleton, ring_and_center);

        let mask = mask_from_fn(6, 10, |y, _| y == 0);
        assert_eq!(thin(&mask), mask);
    }

    #[test]
    fn test_band_touching_the_edge_detaches_from_frame() {
        let mask = mask_from_fn(8, 10, |y, _| y < 4);
        let skeleton = thin(&mask);

        let expected = mask_from_fn(8, 10, |y, x| {
            y == 0 || (y < 4 && (x == 0 || x == 9)) || (y == 2 && (2..7).contains(&x))
        });
        assert_eq!(skeleton, expected);
    }

    #[test]
    fn test_masks_without_interior_are_unchanged() {
        let mask = mask_from_fn(2, 9, |_, x| x % 2 == 0);
        let (skeleton, stats) = thin_with_stats(&mask);
        assert_eq!(skeleton, mask);
        assert_eq!(stats, ThinningStats::default());

        let empty = Array2::<u8>::zeros((0, 0));
        assert_eq!(thin(&empty).dim(), (0, 0));
    }

    #[test]
    fn test_stats_count_removed_pixels() {
        let mask = mask_from_fn(12, 30, |y, x| (3..9).contains(&y) && (3..27).contains(&x));
        let (skeleton, stats) = thin_with_stats(&mask);
        let before = foreground(&mask).len();
        let after = foreground(&skeleton).len();

        assert_eq!(stats.removed, before - after);
        assert!(stats.iterations >= 2);
    }

    #[test]
    fn test_line_is_already_thin() {
        let mask = mask_from_fn(9, 9, |y, x| y == 4 && (1..8).contains(&x));
        let (skeleton, stats) = thin_with_stats(&mask);
        assert_eq!(skeleton, mask);
        assert_eq!(stats.iterations, 1);
    }
}
