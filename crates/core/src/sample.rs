//! Random down-sampling of candidate rectangles to a coverage ratio.

use crate::geometry::Rect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PAGE_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Number of rectangles kept out of `n` for `ratio`: `floor(n * ratio)`,
/// clamped to `[0, n]`.
pub fn sample_size(n: usize, ratio: f64) -> usize {
    let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
    ((n as f64 * ratio).floor() as usize).min(n)
}

/// Keeps a uniform random subset of `floor(n * ratio)` rectangles.
///
/// All rectangles are kept when the subset would be the whole set; none when
/// it would be empty. Survivors keep their relative order.
pub fn sample_rects<R: Rng + ?Sized>(rects: Vec<Rect>, ratio: f64, rng: &mut R) -> Vec<Rect> {
    let n = rects.len();
    let k = sample_size(n, ratio);
    if k == n {
        return rects;
    }
    if k == 0 {
        return Vec::new();
    }

    let mut picked = rand::seq::index::sample(rng, n, k).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| rects[i]).collect()
}

/// Independent generator for one page, derived from the invocation seed so
/// the outcome does not depend on which order pages are processed in.
pub fn page_rng(seed: u64, page_index: usize) -> StdRng {
    let mixed = seed ^ (page_index as u64).wrapping_add(1).wrapping_mul(PAGE_SEED_MIX);
    StdRng::seed_from_u64(mixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rects(n: usize) -> Vec<Rect> {
        (0..n)
            .map(|i| Rect::new(i as f32 * 10.0, 0.0, i as f32 * 10.0 + 5.0, 10.0).unwrap())
            .collect()
    }

    #[test]
    fn test_sample_size() {
        assert_eq!(sample_size(10, 0.95), 9);
        assert_eq!(sample_size(10, 1.0), 10);
        assert_eq!(sample_size(10, 0.0), 0);
        assert_eq!(sample_size(3, 0.5), 1);
        assert_eq!(sample_size(0, 0.7), 0);
        assert_eq!(sample_size(4, 2.0), 4);
    }

    #[test]
    fn test_full_ratio_keeps_everything() {
        let mut rng = StdRng::seed_from_u64(1);
        let input = rects(7);
        assert_eq!(sample_rects(input.clone(), 1.0, &mut rng), input);
    }

    #[test]
    fn test_zero_ratio_keeps_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_rects(rects(7), 0.0, &mut rng).is_empty());
        // floor(1 * 0.95) == 0
        assert!(sample_rects(rects(1), 0.95, &mut rng).is_empty());
    }

    #[test]
    fn test_partial_ratio_picks_distinct_subset() {
        let input = rects(10);
        let mut rng = StdRng::seed_from_u64(42);
        let picked = sample_rects(input.clone(), 0.5, &mut rng);
        assert_eq!(picked.len(), 5);
        for rect in &picked {
            assert!(input.contains(rect));
        }
        for pair in picked.windows(2) {
            assert!(pair[0].x0 < pair[1].x0);
        }
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let a = sample_rects(rects(20), 0.3, &mut page_rng(99, 4));
        let b = sample_rects(rects(20), 0.3, &mut page_rng(99, 4));
        assert_eq!(a, b);
    }
}
