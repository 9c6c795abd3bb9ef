use crate::mat;
use thiserror::Error;

/// Errors raised while constructing an [`Instance`].
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("requirement matrix must be square: row {row} has {len} entries, expected {n}")]
    NotSquare { row: usize, len: usize, n: usize },
    #[error("state space of the requirement matrix does not fit in a usize index")]
    TooLarge,
    #[error("invalid matrix JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A tangle instance: `n` tracks and a symmetric matrix of required swap counts.
///
/// The off-diagonal magnitude `|m[i][j]|` is the number of times tracks `i`
/// and `j` must cross over the whole schedule; the sign only affects how the
/// renderer draws the crossing. Diagonal entries are per-track twist counts,
/// ignored by the solver.
///
/// Requirement counts are taken from the upper triangle and mirrored down,
/// the same normalization the JSON import has always applied.
#[derive(Clone, Debug)]
pub struct Instance {
    n: usize,
    raw: Vec<Vec<i64>>,
    reqs: Vec<Vec<u32>>,
}

impl Instance {
    pub fn new(raw: Vec<Vec<i64>>) -> Result<Self, InstanceError> {
        let n = raw.len();
        for (row, r) in raw.iter().enumerate() {
            if r.len() != n {
                return Err(InstanceError::NotSquare {
                    row,
                    len: r.len(),
                    n,
                });
            }
        }
        let mut reqs = mat![0u32; n; n];
        for i in 0..n {
            for j in i + 1..n {
                let c =
                    u32::try_from(raw[i][j].unsigned_abs()).map_err(|_| InstanceError::TooLarge)?;
                reqs[i][j] = c;
                reqs[j][i] = c;
            }
        }
        // The memo table is a dense array of num_states entries, so the
        // product of (count + 1) over all pairs must be addressable.
        let mut states = 1usize;
        for i in 0..n {
            for j in i + 1..n {
                states = states
                    .checked_mul(reqs[i][j] as usize + 1)
                    .ok_or(InstanceError::TooLarge)?;
            }
        }
        Ok(Self { n, raw, reqs })
    }

    /// Parses a JSON rectangular array of integers.
    pub fn from_json_str(text: &str) -> Result<Self, InstanceError> {
        let raw: Vec<Vec<i64>> = serde_json::from_str(text)?;
        Self::new(raw)
    }

    pub fn to_json_string(&self, pretty: bool) -> String {
        if pretty {
            serde_json::to_string_pretty(&self.raw).unwrap()
        } else {
            serde_json::to_string(&self.raw).unwrap()
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Required number of crossings between tracks `i` and `j`.
    pub fn count(&self, i: usize, j: usize) -> u32 {
        self.reqs[i][j]
    }

    /// The full symmetric count matrix (diagonal zero).
    pub fn counts(&self) -> &[Vec<u32>] {
        &self.reqs
    }

    /// The matrix as given, signs and diagonal included.
    pub fn matrix(&self) -> &Vec<Vec<i64>> {
        &self.raw
    }

    /// Twist count of track `i` (diagonal entry; renderer only).
    pub fn twist(&self, i: usize) -> i64 {
        self.raw[i][i]
    }

    /// Signed raw entry for the pair, read from the upper triangle.
    pub fn sign(&self, i: usize, j: usize) -> i64 {
        self.raw[i.min(j)][i.max(j)]
    }

    /// Total number of swaps any schedule for this instance must contain.
    pub fn total_swaps(&self) -> u64 {
        let mut total = 0;
        for i in 0..self.n {
            for j in i + 1..self.n {
                total += self.reqs[i][j] as u64;
            }
        }
        total
    }

    /// All unordered pairs `(i, j)` with `i < j`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.n).flat_map(move |i| (i + 1..self.n).map(move |j| (i, j)))
    }

    /// Whether any schedule exists at all: the parity pairs of the full
    /// requirement matrix must admit a resolution. Callers are expected to
    /// check this before searching; the solvers re-check and reject.
    pub fn schedulable(&self) -> bool {
        crate::solve::resolve_parity(&self.reqs).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_triangle_is_mirrored_and_abs() {
        let inst = Instance::new(vec![vec![1, -2, 0], vec![9, 0, 1], vec![0, 1, -3]]).unwrap();
        assert_eq!(inst.count(0, 1), 2);
        assert_eq!(inst.count(1, 0), 2);
        assert_eq!(inst.count(0, 2), 0);
        assert_eq!(inst.sign(1, 0), -2);
        assert_eq!(inst.twist(0), 1);
        assert_eq!(inst.twist(2), -3);
        assert_eq!(inst.total_swaps(), 3);
    }

    #[test]
    fn test_rejects_ragged_matrix() {
        let err = Instance::new(vec![vec![0, 1], vec![1, 0, 0]]).unwrap_err();
        assert!(matches!(err, InstanceError::NotSquare { row: 1, .. }));
    }

    #[test]
    fn test_rejects_oversized_state_space() {
        // Two pairs of ~2^33 counts overflow the 64-bit state product.
        let c = 1i64 << 33;
        let m = vec![
            vec![0, c, c],
            vec![c, 0, 0],
            vec![c, 0, 0],
        ];
        assert!(matches!(
            Instance::new(m),
            Err(InstanceError::TooLarge)
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let text = "[[0,2,0],[2,0,1],[0,1,0]]";
        let inst = Instance::from_json_str(text).unwrap();
        assert_eq!(inst.n(), 3);
        assert_eq!(inst.count(1, 2), 1);
        assert_eq!(inst.to_json_string(false), text);
    }

    #[test]
    fn test_schedulable() {
        // (0, 1) must swap once and they start adjacent.
        let yes = Instance::new(vec![vec![0, 1], vec![1, 0]]).unwrap();
        assert!(yes.schedulable());
        // (0, 2) alone can never become adjacent: no other pair moves them.
        let no = Instance::new(vec![vec![0, 0, 1], vec![0, 0, 0], vec![1, 0, 0]]).unwrap();
        assert!(!no.schedulable());
    }
}
