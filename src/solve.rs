use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

use crate::codec::StateCodec;
use crate::instance::Instance;
use crate::{SetMinMax, mat};

/// One swap between tracks `i` and `j` (unordered, stored `i < j`).
pub type Swap = (usize, usize);

/// One scheduling step: a set of track-disjoint swaps applied simultaneously,
/// each between tracks that are adjacent when the round starts.
pub type Round = Vec<Swap>;

/// A complete schedule for an instance (or for an intermediate state).
///
/// `rounds` is ordered from the first round applied to the last; `positions`
/// maps each track to its final position, which depends only on the parity
/// of the pairwise crossing counts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub height: usize,
    pub rounds: Vec<Round>,
    pub positions: Vec<usize>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    #[error("no permutation resolves the parity pairs of the requirement matrix")]
    Unschedulable,
    #[error("requirement matrix admits no round decomposition")]
    Infeasible,
}

// --------------------------- Parity resolution ----------------------------

pub struct ParityResolution {
    /// Single-swap rounds realizing exactly the odd-count pairs.
    pub rounds: Vec<Round>,
    /// positions[track] = position after all swaps of the selection, odd and
    /// even alike, since even counts cancel out.
    pub positions: Vec<usize>,
}

/// Greedily resolves the odd-count pairs of a selection: repeatedly swaps any
/// pending pair whose tracks are currently adjacent. Returns `None` when
/// pending pairs remain but none is adjacent; that is a dead end, no schedule
/// realizes the selection.
pub fn resolve_parity(sel: &[Vec<u32>]) -> Option<ParityResolution> {
    let n = sel.len();
    let mut pending: Vec<Swap> = vec![];
    for i in 0..n {
        for j in i + 1..n {
            if sel[i][j] % 2 == 1 {
                pending.push((i, j));
            }
        }
    }
    let mut positions = (0..n).collect_vec();
    let mut rounds = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let k = pending
            .iter()
            .position(|&(i, j)| positions[i].abs_diff(positions[j]) == 1)?;
        let (i, j) = pending.remove(k);
        positions.swap(i, j);
        rounds.push(vec![(i, j)]);
    }
    Some(ParityResolution { rounds, positions })
}

// --------------------------- Round feasibility ----------------------------

/// Can the swaps of `round` be applied simultaneously under `positions`?
/// Every swap must join adjacent tracks and no track may occur twice.
pub fn round_feasible(positions: &[usize], round: &[Swap]) -> bool {
    for &(i, j) in round {
        if positions[i].abs_diff(positions[j]) != 1 {
            return false;
        }
    }
    let mut occur = vec![false; positions.len()];
    for &(i, j) in round {
        if occur[i] || occur[j] {
            return false;
        }
        occur[i] = true;
        occur[j] = true;
    }
    true
}

fn unique_pairs(sel: &[Vec<u32>]) -> Vec<Swap> {
    let n = sel.len();
    let mut pairs = vec![];
    for i in 0..n {
        for j in i + 1..n {
            if sel[i][j] > 0 {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

// ------------------------------ Memoized search ---------------------------

#[derive(Clone, Debug)]
enum MemoEntry {
    Unvisited,
    Infeasible,
    Solved(Solution),
}

/// Top-down memoized search over the state space of one instance.
///
/// The memo table is a flat arena indexed by state: entries are written once
/// (Infeasible or Solved) and never overwritten, which also guards the
/// recursion against revisiting, since removing a round strictly decreases
/// the index.
pub struct Solver<'a> {
    inst: &'a Instance,
    codec: StateCodec,
    memo: Vec<MemoEntry>,
    optimal: Option<bool>,
}

impl<'a> Solver<'a> {
    pub fn new(inst: &'a Instance) -> Self {
        let codec = StateCodec::new(inst);
        let memo = vec![MemoEntry::Unvisited; codec.num_states()];
        Self {
            inst,
            codec,
            memo,
            optimal: None,
        }
    }

    pub fn num_states(&self) -> usize {
        self.codec.num_states()
    }

    /// Minimum-height schedule realizing the requirement matrix exactly.
    pub fn solve_optimal(&mut self) -> Result<Solution, SolveError> {
        self.run(true)
    }

    /// Some schedule realizing the requirement matrix, found by trying only
    /// single-swap final rounds. Any round of disjoint adjacent swaps can be
    /// serialized into single swaps without disturbing the others' adjacency,
    /// so this finds a schedule whenever one exists, just not the lowest one.
    pub fn solve_feasible(&mut self) -> Result<Solution, SolveError> {
        self.run(false)
    }

    fn run(&mut self, optimal: bool) -> Result<Solution, SolveError> {
        if !self.inst.schedulable() {
            return Err(SolveError::Unschedulable);
        }
        // Heights memoized by one search mode are meaningless to the other.
        if self.optimal != Some(optimal) {
            self.memo.fill(MemoEntry::Unvisited);
            self.optimal = Some(optimal);
        }
        let top = self.codec.top();
        self.solve_rec(top, optimal);
        match &self.memo[top] {
            MemoEntry::Solved(sol) => Ok(sol.clone()),
            MemoEntry::Infeasible => Err(SolveError::Infeasible),
            MemoEntry::Unvisited => unreachable!("top state visited by solve_rec"),
        }
    }

    fn solve_rec(&mut self, index: usize, optimal: bool) {
        if !matches!(self.memo[index], MemoEntry::Unvisited) {
            return;
        }
        let (sel, set_size) = self.codec.decode(index);
        // The final positions of this state, which every candidate last round
        // is checked against: a swap's tracks are adjacent before a round iff
        // they are adjacent after it.
        let Some(parity) = resolve_parity(&sel) else {
            self.memo[index] = MemoEntry::Infeasible;
            return;
        };
        let unique = unique_pairs(&sel);

        let mut best_height = usize::MAX;
        let mut best_rounds = None;
        if unique.len() as u64 == set_size {
            // Every pair needs exactly one more swap, so the parity
            // resolution is itself a schedule for this state.
            best_height = parity.rounds.len();
            best_rounds = Some(parity.rounds.clone());
        }

        // Guess the final round among all feasible subsets of the remaining
        // pairs. Rounds larger than n/2 swaps can never be disjoint, so the
        // upper bound prunes nothing real away.
        let max_size = if optimal {
            (self.inst.n() / 2).max(unique.len().saturating_sub(1))
        } else {
            1
        };
        for size in 1..=max_size {
            for round in unique.iter().copied().combinations(size) {
                if !round_feasible(&parity.positions, &round) {
                    continue;
                }
                let prev = self.codec.remove(index, &round);
                self.solve_rec(prev, optimal);
                let MemoEntry::Solved(prev_sol) = &self.memo[prev] else {
                    continue;
                };
                if best_height.setmin(prev_sol.height + 1) {
                    let mut rounds = prev_sol.rounds.clone();
                    rounds.push(round);
                    best_rounds = Some(rounds);
                }
            }
        }

        self.memo[index] = match best_rounds {
            Some(rounds) => MemoEntry::Solved(Solution {
                height: best_height,
                rounds,
                positions: parity.positions,
            }),
            None => MemoEntry::Infeasible,
        };
    }
}

// --------------------------- Schedule verification ------------------------

/// Replays a schedule against the instance: every round must be applicable in
/// the permutation in effect when it starts, every pair's applied swap count
/// must equal its requirement, and the final positions must match.
pub fn check_schedule(inst: &Instance, sol: &Solution) -> bool {
    let n = inst.n();
    if sol.height != sol.rounds.len() || sol.positions.len() != n {
        return false;
    }
    let mut positions = (0..n).collect_vec();
    let mut applied = mat![0u32; n; n];
    for round in &sol.rounds {
        if !round_feasible(&positions, round) {
            return false;
        }
        for &(i, j) in round {
            positions.swap(i, j);
            applied[i.min(j)][i.max(j)] += 1;
        }
    }
    if positions != sol.positions {
        return false;
    }
    inst.pairs().all(|(i, j)| applied[i][j] == inst.count(i, j))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(m: Vec<Vec<i64>>) -> Instance {
        Instance::new(m).unwrap()
    }

    #[test]
    fn test_single_swap_pair() {
        let inst = instance(vec![vec![0, 1], vec![1, 0]]);
        let sol = Solver::new(&inst).solve_optimal().unwrap();
        assert_eq!(sol.height, 1);
        assert_eq!(sol.rounds, vec![vec![(0, 1)]]);
        assert_eq!(sol.positions, vec![1, 0]);
        assert!(check_schedule(&inst, &sol));
    }

    #[test]
    fn test_empty_requirement_has_height_zero() {
        let inst = instance(vec![vec![0; 3]; 3]);
        let sol = Solver::new(&inst).solve_optimal().unwrap();
        assert_eq!(sol.height, 0);
        assert!(sol.rounds.is_empty());
        assert_eq!(sol.positions, vec![0, 1, 2]);
        assert!(check_schedule(&inst, &sol));
    }

    #[test]
    fn test_even_count_needs_two_rounds() {
        // Pair (0, 1) crosses twice: no parity baseline exists, the search
        // has to stack two single-swap rounds.
        let inst = instance(vec![vec![0, 2, 0], vec![2, 0, 0], vec![0, 0, 0]]);
        let mut solver = Solver::new(&inst);
        let sol = solver.solve_optimal().unwrap();
        assert_eq!(sol.height, 2);
        assert_eq!(sol.rounds, vec![vec![(0, 1)], vec![(0, 1)]]);
        assert_eq!(sol.positions, vec![0, 1, 2]);
        assert!(check_schedule(&inst, &sol));
        // The feasibility-only variant agrees here.
        assert_eq!(solver.solve_feasible().unwrap().height, 2);
    }

    #[test]
    fn test_unschedulable_is_rejected_up_front() {
        let inst = instance(vec![vec![0, 0, 1], vec![0, 0, 0], vec![1, 0, 0]]);
        assert_eq!(
            Solver::new(&inst).solve_optimal(),
            Err(SolveError::Unschedulable)
        );
    }

    #[test]
    fn test_disjoint_swaps_share_a_round() {
        // (0,1) and (2,3) can swap simultaneously; the optimal schedule has
        // one round while the single-swap feasibility search needs two.
        let inst = instance(vec![
            vec![0, 1, 0, 0],
            vec![1, 0, 0, 0],
            vec![0, 0, 0, 1],
            vec![0, 0, 1, 0],
        ]);
        let sol = Solver::new(&inst).solve_optimal().unwrap();
        assert_eq!(sol.height, 1);
        assert_eq!(sol.rounds, vec![vec![(0, 1), (2, 3)]]);
        assert!(check_schedule(&inst, &sol));

        let feasible = Solver::new(&inst).solve_feasible().unwrap();
        assert_eq!(feasible.height, 2);
        assert!(check_schedule(&inst, &feasible));
    }

    #[test]
    fn test_conflicting_pairs_never_share_a_round() {
        // (0,1) and (1,2) share track 1, so all rounds are singletons and the
        // three required swaps need three rounds.
        let inst = instance(vec![vec![0, 1, 0], vec![1, 0, 2], vec![0, 2, 0]]);
        let sol = Solver::new(&inst).solve_optimal().unwrap();
        assert_eq!(sol.height, 3);
        assert_eq!(sol.positions, vec![1, 0, 2]);
        assert!(check_schedule(&inst, &sol));
    }

    #[test]
    fn test_dense_three_track_instance() {
        // All three pairs cross once: the swap between the outer tracks only
        // becomes adjacent after one of the inner swaps, and two of the three
        // swaps conflict pairwise, so the optimum is 3 rounds.
        let inst = instance(vec![vec![0, 1, 1], vec![1, 0, 1], vec![1, 1, 0]]);
        let sol = Solver::new(&inst).solve_optimal().unwrap();
        assert_eq!(sol.height, 3);
        assert_eq!(sol.positions, vec![2, 1, 0]);
        assert!(check_schedule(&inst, &sol));
    }

    #[test]
    fn test_memo_is_idempotent() {
        let inst = instance(vec![vec![0, 2, 1], vec![2, 0, 1], vec![1, 1, 0]]);
        let mut solver = Solver::new(&inst);
        let first = solver.solve_optimal().unwrap();
        // Entries are write-once; a second query reads the stored result.
        let second = solver.solve_optimal().unwrap();
        assert_eq!(first, second);
        assert!(check_schedule(&inst, &first));
    }

    #[test]
    fn test_reconstruction_heights_step_down_by_one() {
        let inst = instance(vec![
            vec![0, 2, 0, 0],
            vec![2, 0, 0, 0],
            vec![0, 0, 0, 2],
            vec![0, 0, 2, 0],
        ]);
        let mut solver = Solver::new(&inst);
        let sol = solver.solve_optimal().unwrap();
        assert_eq!(sol.height, 2);
        assert!(check_schedule(&inst, &sol));
        // Walk the reconstruction: stripping the final round must land on a
        // memoized state solved at exactly one less height.
        let mut index = solver.codec.top();
        for (steps, round) in sol.rounds.iter().rev().enumerate() {
            index = solver.codec.remove(index, round);
            match &solver.memo[index] {
                MemoEntry::Solved(prev) => assert_eq!(prev.height, sol.height - steps - 1),
                _ => panic!("reconstruction state not solved"),
            }
        }
        assert_eq!(index, 0);
    }

    #[test]
    fn test_parity_resolution_dead_end() {
        // Pairs (0,2) and (1,3): neither is adjacent at the start and
        // swapping neither is possible, so resolution fails immediately.
        let sel = vec![
            vec![0, 0, 1, 0],
            vec![0, 0, 0, 1],
            vec![1, 0, 0, 0],
            vec![0, 1, 0, 0],
        ];
        assert!(resolve_parity(&sel).is_none());
    }

    #[test]
    fn test_round_feasible_checks() {
        let positions = vec![0, 1, 2, 3];
        assert!(round_feasible(&positions, &[(0, 1), (2, 3)]));
        assert!(!round_feasible(&positions, &[(0, 2)]));
        assert!(!round_feasible(&positions, &[(0, 1), (1, 2)]));
        assert!(round_feasible(&positions, &[]));
    }

    #[test]
    fn test_check_schedule_rejects_tampering() {
        let inst = instance(vec![vec![0, 1], vec![1, 0]]);
        let sol = Solver::new(&inst).solve_optimal().unwrap();
        let mut extra_round = sol.clone();
        extra_round.rounds.push(vec![(0, 1)]);
        extra_round.height += 1;
        assert!(!check_schedule(&inst, &extra_round));
        let mut wrong_height = sol.clone();
        wrong_height.height = 7;
        assert!(!check_schedule(&inst, &wrong_height));
    }
}
