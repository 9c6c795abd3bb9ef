//! # Random Instance Generation
//!
//! This module provides functions for generating random solvable tangle
//! instances. Matrices are drawn by rejection sampling: per-pair counts are
//! uniform, draws outside the requested total-swap window are discarded, and
//! unschedulable matrices (no parity resolution) are redrawn.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::instance::Instance;
use crate::mat;

/// Generates a random schedulable instance.
///
/// # Arguments
/// * `n` - The number of tracks.
/// * `max_count` - Upper bound on the swap count of a single pair.
/// * `min_total` / `max_total` - Window for the total number of swaps.
/// * `seed` - An optional seed for the random number generator for reproducibility.
///
/// Retries until a draw lands in the window and is schedulable, so the window
/// must be satisfiable (`min_total` of 0 always is).
pub fn generate(
    n: usize,
    max_count: u32,
    min_total: u64,
    max_total: u64,
    seed: Option<u64>,
) -> Instance {
    debug_assert!(min_total <= max_total);
    let mut rng = match seed {
        Some(s) => ChaCha20Rng::seed_from_u64(s),
        None => ChaCha20Rng::from_os_rng(),
    };
    loop {
        let mut m = mat![0i64; n; n];
        let mut total = 0u64;
        for i in 0..n {
            for j in i + 1..n {
                let c = rng.random_range(0..=max_count);
                m[i][j] = c as i64;
                m[j][i] = c as i64;
                total += c as u64;
            }
        }
        if total < min_total || total > max_total {
            continue;
        }
        let Ok(inst) = Instance::new(m) else { continue };
        if inst.schedulable() {
            return inst;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_instance_is_valid() {
        let inst = generate(5, 2, 4, 12, Some(123));
        assert_eq!(inst.n(), 5);
        assert!(inst.schedulable());
        assert!((4..=12).contains(&inst.total_swaps()));
        for (i, j) in inst.pairs() {
            assert!(inst.count(i, j) <= 2);
            assert_eq!(inst.count(i, j), inst.count(j, i));
        }
    }

    #[test]
    fn test_same_seed_same_instance() {
        let a = generate(4, 3, 1, 10, Some(7));
        let b = generate(4, 3, 1, 10, Some(7));
        assert_eq!(a.matrix(), b.matrix());
    }

    #[test]
    fn test_zero_window_yields_empty_matrix() {
        let inst = generate(3, 2, 0, 0, Some(1));
        assert_eq!(inst.total_swaps(), 0);
    }
}
