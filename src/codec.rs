use crate::instance::Instance;
use crate::mat;
use crate::solve::Swap;

// ----------------------------- State indexing -----------------------------
//
// A partial-schedule state is a selection matrix: for every pair, how many of
// its required swaps are still unscheduled. Selections are packed into a
// mixed-radix integer with one digit per pair and radix count+1, so the memo
// table can be a flat array indexed by state. Pair (n-2, n-1) is the least
// significant digit; index 0 is the all-zero selection and num_states-1 the
// full requirement matrix.

pub struct StateCodec {
    n: usize,
    radix: Vec<Vec<usize>>,
    weight: Vec<Vec<usize>>,
    num_states: usize,
}

impl StateCodec {
    pub fn new(inst: &Instance) -> Self {
        let n = inst.n();
        let mut radix = mat![0usize; n; n];
        let mut weight = mat![0usize; n; n];
        let mut cum = 1usize;
        for i in (0..n.saturating_sub(1)).rev() {
            for j in (i + 1..n).rev() {
                radix[i][j] = inst.count(i, j) as usize + 1;
                weight[i][j] = cum;
                cum = cum
                    .checked_mul(radix[i][j])
                    .expect("state space validated by Instance::new");
            }
        }
        Self {
            n,
            radix,
            weight,
            num_states: cum,
        }
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Index of the full requirement matrix, where every search starts.
    pub fn top(&self) -> usize {
        self.num_states - 1
    }

    /// Unpacks an index into its selection matrix (upper triangle) and the
    /// total number of unscheduled swaps. Indices outside the state space are
    /// a caller bug.
    pub fn decode(&self, index: usize) -> (Vec<Vec<u32>>, u64) {
        assert!(
            index < self.num_states,
            "state index {} out of range 0..{}",
            index,
            self.num_states
        );
        let n = self.n;
        let mut sel = mat![0u32; n; n];
        let mut size = 0u64;
        let mut rest = index;
        for i in (0..n.saturating_sub(1)).rev() {
            for j in (i + 1..n).rev() {
                let c = (rest % self.radix[i][j]) as u32;
                sel[i][j] = c;
                size += c as u64;
                rest /= self.radix[i][j];
            }
        }
        debug_assert_eq!(rest, 0);
        (sel, size)
    }

    /// Packs a selection matrix back into its index.
    pub fn encode(&self, sel: &[Vec<u32>]) -> usize {
        let mut index = 0;
        for i in 0..self.n {
            for j in i + 1..self.n {
                debug_assert!((sel[i][j] as usize) < self.radix[i][j]);
                index += sel[i][j] as usize * self.weight[i][j];
            }
        }
        index
    }

    /// Index of the state reached by unscheduling one swap of every pair in
    /// `round`. Every pair must have a nonzero remaining count in `index`;
    /// violating that corrupts the index space, so it is asserted rather
    /// than reported.
    pub fn remove(&self, index: usize, round: &[Swap]) -> usize {
        let mut index = index;
        for &(i, j) in round {
            debug_assert!(
                self.decode(index).0[i][j] > 0,
                "removing swap ({}, {}) with no remaining count",
                i,
                j
            );
            index -= self.weight[i][j];
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(m: Vec<Vec<i64>>) -> StateCodec {
        StateCodec::new(&Instance::new(m).unwrap())
    }

    #[test]
    fn test_bijection_over_full_range() {
        let codec = codec(vec![vec![0, 2, 1], vec![2, 0, 3], vec![1, 3, 0]]);
        assert_eq!(codec.num_states(), 3 * 2 * 4);
        for index in 0..codec.num_states() {
            let (sel, size) = codec.decode(index);
            assert_eq!(codec.encode(&sel), index);
            let mut total = 0;
            for i in 0..3 {
                for j in i + 1..3 {
                    assert!(sel[i][j] <= codec.radix[i][j] as u32 - 1);
                    total += sel[i][j] as u64;
                }
            }
            assert_eq!(total, size);
        }
    }

    #[test]
    fn test_extreme_indices() {
        let inst = Instance::new(vec![vec![0, 2, 1], vec![2, 0, 3], vec![1, 3, 0]]).unwrap();
        let codec = StateCodec::new(&inst);
        let (zero, size) = codec.decode(0);
        assert_eq!(size, 0);
        assert!(zero.iter().all(|row| row.iter().all(|&c| c == 0)));
        let (full, size) = codec.decode(codec.top());
        assert_eq!(size, inst.total_swaps());
        for (i, j) in inst.pairs() {
            assert_eq!(full[i][j], inst.count(i, j));
        }
    }

    #[test]
    fn test_remove_decrements_one_unit_per_pair() {
        let codec = codec(vec![
            vec![0, 1, 0, 2],
            vec![1, 0, 1, 0],
            vec![0, 1, 0, 1],
            vec![2, 0, 1, 0],
        ]);
        let top = codec.top();
        let (full, _) = codec.decode(top);
        let prev = codec.remove(top, &[(0, 1), (2, 3)]);
        let (sel, _) = codec.decode(prev);
        for i in 0..4 {
            for j in i + 1..4 {
                let expected = if (i, j) == (0, 1) || (i, j) == (2, 3) {
                    full[i][j] - 1
                } else {
                    full[i][j]
                };
                assert_eq!(sel[i][j], expected, "pair ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_single_pair_states_count_down() {
        // One pair with count 2: indices 0, 1, 2 are selections 0, 1, 2.
        let codec = codec(vec![vec![0, 2], vec![2, 0]]);
        assert_eq!(codec.num_states(), 3);
        for c in 0..3u32 {
            let (sel, size) = codec.decode(c as usize);
            assert_eq!(sel[0][1], c);
            assert_eq!(size, c as u64);
        }
        assert_eq!(codec.remove(2, &[(0, 1)]), 1);
        assert_eq!(codec.remove(1, &[(0, 1)]), 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_decode_out_of_range_panics() {
        let codec = codec(vec![vec![0, 1], vec![1, 0]]);
        codec.decode(2);
    }
}
