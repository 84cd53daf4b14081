//! Implementation of greedy best-first search for the sliding-tile puzzle.
//!
//! The frontier always expands the node with the lowest heuristic estimate of
//! the remaining distance, without accounting for the cost already spent, so
//! the solution found is not necessarily the shortest one.

use std::collections::BinaryHeap;
use std::time::Duration;

use derive_more::Display;
use hrsw::Stopwatch;
use human_duration::human_duration;
use rustc_hash::FxHashSet;
use thousands::Separable;

use crate::problems::tile_puzzle::Direction;
use crate::problems::tile_puzzle::GridState;
use crate::problems::tile_puzzle::TilePuzzle;
use crate::search::SearchTree;
use crate::search::SearchTreeIndex;
use crate::search::SearchTreeNode;

/// The closed set of heuristic estimators.
///
/// Both attain `0` exactly on the target state, and only there. That is the
/// search's sole termination signal, so the property is load-bearing.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Heuristic {
    /// Number of non-blank cells whose value differs from the target's value
    /// at the same position.
    #[display("out-of-place-count")]
    OutOfPlaceCount,
    /// Sum of the Manhattan distances between every non-blank value's current
    /// and target coordinates.
    #[display("total-distance")]
    TotalDistance,
}

impl Heuristic {
    /// Estimates how far `state` is from `target`. Lower is closer.
    #[must_use]
    pub fn evaluate(self, state: &GridState, target: &GridState) -> u32 {
        match self {
            Heuristic::OutOfPlaceCount => out_of_place_count(state, target),
            Heuristic::TotalDistance => total_distance(state, target),
        }
    }
}

fn out_of_place_count(state: &GridState, target: &GridState) -> u32 {
    let mut wrong_position_count = 0;

    for row in 0..state.rows() {
        for column in 0..state.columns() {
            let value = state.value_at(row, column);
            if value != 0 && value != target.value_at(row, column) {
                wrong_position_count += 1;
            }
        }
    }

    wrong_position_count
}

fn total_distance(state: &GridState, target: &GridState) -> u32 {
    let rows = state.rows();
    let columns = state.columns();

    // value → coordinates, one pass per state.
    let mut current_coords = vec![(0usize, 0usize); rows * columns];
    let mut target_coords = vec![(0usize, 0usize); rows * columns];
    for row in 0..rows {
        for column in 0..columns {
            current_coords[state.value_at(row, column) as usize] = (row, column);
            target_coords[target.value_at(row, column) as usize] = (row, column);
        }
    }

    // Value 0 is the blank and does not count.
    let mut distance = 0u32;
    for value in 1..rows * columns {
        let (current_row, current_column) = current_coords[value];
        let (target_row, target_column) = target_coords[value];
        distance += (current_row.abs_diff(target_row) + current_column.abs_diff(target_column))
            as u32;
    }

    distance
}

/// A frontier entry carrying just the rank and the arena index of its node.
#[derive(Copy, Clone, Debug)]
struct GreedyHeapNode {
    h: u32,
    node_index: SearchTreeIndex,
}

/// PartialEq is forwarded to the rank; the node index is ignored.
impl PartialEq for GreedyHeapNode {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.h == other.h
    }
}
impl Eq for GreedyHeapNode {}

impl PartialOrd for GreedyHeapNode {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
/// `BinaryHeap` is a max-heap, so the rank comparison is reversed: the lowest
/// heuristic value pops first. Ties break however the heap pleases, which is
/// deterministic for identical inputs but not otherwise meaningful.
impl Ord for GreedyHeapNode {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.h.cmp(&self.h)
    }
}

/// Greedy best-first solver bound to one puzzle definition.
///
/// Every `solve` call owns a fresh frontier, visited set and search tree, so
/// repeated calls never observe one another's state.
#[derive(Clone, Debug)]
pub struct GreedySearch {
    puzzle: TilePuzzle,
    iteration_limit: usize,
}

impl GreedySearch {
    #[must_use]
    pub fn new(puzzle: TilePuzzle) -> Self {
        Self {
            puzzle,
            iteration_limit: 0,
        }
    }

    /// Bounds the number of Select/Expand cycles; `0` means unlimited.
    #[must_use]
    pub fn set_iteration_limit(mut self, iteration_limit: usize) -> Self {
        self.iteration_limit = iteration_limit;
        self
    }

    pub fn puzzle(&self) -> &TilePuzzle {
        &self.puzzle
    }
    pub fn iteration_limit(&self) -> usize {
        self.iteration_limit
    }

    /// Runs the search to termination: heuristic `0` popped, iteration limit
    /// reached, or frontier exhausted.
    ///
    /// An unsolved outcome is a normal result, never an error.
    #[must_use]
    pub fn solve(&self, heuristic: Heuristic) -> SearchResult {
        let target = self.puzzle.target_state();
        let mut stopwatch = Stopwatch::new_started();

        let mut tree = SearchTree::new();
        let mut open = BinaryHeap::new();
        let mut visited = FxHashSet::default();

        let root_h = heuristic.evaluate(self.puzzle.initial_state(), target);
        let root = tree.push(SearchTreeNode::new(
            self.puzzle.initial_state().clone(),
            root_h,
            None,
        ));
        open.push(GreedyHeapNode {
            h: root_h,
            node_index: root,
        });
        let mut node_count = 1usize;
        let mut iteration_count = 0usize;
        let mut terminal = None;

        while let Some(GreedyHeapNode { h, node_index }) = open.pop() {
            iteration_count += 1;
            terminal = Some(node_index);

            if h == 0 || (self.iteration_limit > 0 && iteration_count >= self.iteration_limit) {
                break;
            }

            // Mark the state being expanded, then generate its children; a
            // state never re-enters the frontier once it is marked.
            let state = tree[node_index].state().clone();
            visited.insert(state.key());

            for (child, direction) in self.puzzle.neighbours(&state) {
                if visited.contains(&child.key()) {
                    continue;
                }

                let child_h = heuristic.evaluate(&child, target);
                let child_index =
                    tree.push(SearchTreeNode::new(child, child_h, Some((node_index, direction))));
                open.push(GreedyHeapNode {
                    h: child_h,
                    node_index: child_index,
                });
                node_count += 1;
            }

            log::trace!(
                "expanded h={h}: frontier={}, tree={}",
                open.len(),
                tree.len()
            );
        }

        stopwatch.stop();
        let solved = terminal.is_some_and(|index| tree[index].state() == target);
        log::debug!(
            "{heuristic} run on {}: solved={solved}, iterations={iteration_count}, nodes={node_count}",
            self.puzzle
        );

        SearchResult {
            solved,
            iteration_count,
            node_count,
            elapsed: stopwatch.elapsed(),
            tree,
            terminal,
        }
    }
}

/// The outcome of one `solve` run. Read-only.
#[derive(Debug)]
pub struct SearchResult {
    solved: bool,
    iteration_count: usize,
    node_count: usize,
    elapsed: Duration,
    tree: SearchTree,
    terminal: Option<SearchTreeIndex>,
}

impl SearchResult {
    /// Whether the terminal node's state equals the target state.
    pub fn is_solved(&self) -> bool {
        self.solved
    }
    /// Select/Expand cycles performed.
    pub fn iteration_count(&self) -> usize {
        self.iteration_count
    }
    /// Nodes ever enqueued, the root included.
    pub fn node_count(&self) -> usize {
        self.node_count
    }
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The sequence of states from the initial board to the terminal one,
    /// each paired with the blank move that produced it (`None` for the
    /// root). Recomputed fresh on every call.
    #[must_use]
    pub fn reconstruct_path(&self) -> Vec<(GridState, Option<Direction>)> {
        match self.terminal {
            Some(index) => self.tree.path(index),
            None => Vec::new(),
        }
    }

    /// Renders the path as boards joined by the move that produced each one,
    /// with a literal `|` line between entries.
    #[must_use]
    pub fn render_path(&self) -> String {
        let mut out = String::new();
        for (state, direction) in self.reconstruct_path() {
            if let Some(direction) = direction {
                out.push_str("\n|\n");
                out.push_str(&direction.to_string());
                out.push_str("\n|\n");
            }
            out.push_str(&state.to_string());
        }
        out
    }
}

impl std::fmt::Display for SearchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "SearchResult(solved: {}, iterations: {}, nodes: {}, elapsed: {})",
            self.solved,
            self.iteration_count.separate_with_commas(),
            self.node_count.separate_with_commas(),
            human_duration(&self.elapsed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(cells: &[&[u32]]) -> GridState {
        GridState::new(cells.iter().map(|line| line.to_vec()).collect())
    }

    fn solved_3x3() -> GridState {
        state(&[&[1, 2, 3], &[4, 5, 6], &[7, 8, 0]])
    }

    /// The near-solved instance from the original example set.
    fn shuffled_3x3() -> TilePuzzle {
        TilePuzzle::new(
            3,
            3,
            state(&[&[8, 1, 2], &[0, 4, 3], &[7, 6, 5]]),
            solved_3x3(),
        )
        .unwrap()
    }

    fn sorted_values(state: &GridState) -> Vec<u32> {
        let mut values = Vec::new();
        for row in 0..state.rows() {
            for column in 0..state.columns() {
                values.push(state.value_at(row, column));
            }
        }
        values.sort_unstable();
        values
    }

    #[test]
    fn heuristics_are_zero_exactly_on_the_target() {
        let target = solved_3x3();
        let one_move_away = state(&[&[1, 2, 3], &[4, 5, 6], &[7, 0, 8]]);

        for heuristic in [Heuristic::OutOfPlaceCount, Heuristic::TotalDistance] {
            assert_eq!(heuristic.evaluate(&target, &target), 0);
            assert!(heuristic.evaluate(&one_move_away, &target) > 0);
        }
    }

    #[test]
    fn heuristic_values_match_hand_computation() {
        let puzzle = shuffled_3x3();
        let initial = puzzle.initial_state();
        let target = puzzle.target_state();

        assert_eq!(Heuristic::OutOfPlaceCount.evaluate(initial, target), 7);
        assert_eq!(Heuristic::TotalDistance.evaluate(initial, target), 11);
    }

    #[test]
    fn already_solved_puzzle_terminates_on_the_first_pop() {
        let puzzle = TilePuzzle::new(3, 3, solved_3x3(), solved_3x3()).unwrap();
        let solver = GreedySearch::new(puzzle);

        for heuristic in [Heuristic::OutOfPlaceCount, Heuristic::TotalDistance] {
            let result = solver.solve(heuristic);
            assert!(result.is_solved());
            assert_eq!(result.iteration_count(), 1);
            assert_eq!(result.node_count(), 1);

            let path = result.reconstruct_path();
            assert_eq!(path.len(), 1);
            assert_eq!(path[0], (solved_3x3(), None));
            assert_eq!(result.render_path(), "1|2|3\n4|5|6\n7|8|0");
        }
    }

    #[test]
    fn two_move_instance_walks_straight_to_the_target() {
        let puzzle = TilePuzzle::new(
            3,
            3,
            state(&[&[1, 2, 3], &[4, 5, 6], &[0, 7, 8]]),
            solved_3x3(),
        )
        .unwrap();
        let solver = GreedySearch::new(puzzle.clone());

        for heuristic in [Heuristic::OutOfPlaceCount, Heuristic::TotalDistance] {
            let result = solver.solve(heuristic);
            assert!(result.is_solved());
            assert_eq!(result.iteration_count(), 3);
            assert_eq!(result.node_count(), 5);

            // Path validity: starts at the initial board, ends on the target,
            // and every step is the recorded legal blank move.
            let path = result.reconstruct_path();
            assert_eq!(path[0].0, *puzzle.initial_state());
            assert_eq!(path[0].1, None);
            assert_eq!(path.last().unwrap().0, *puzzle.target_state());
            for pair in path.windows(2) {
                let (previous, _) = &pair[0];
                let (next, direction) = &pair[1];
                assert_eq!(puzzle.apply(previous, direction.unwrap()).as_ref(), Some(next));
            }

            // Conservation: moves only relocate the blank.
            for (state, _) in &path {
                assert_eq!(sorted_values(state), sorted_values(puzzle.initial_state()));
            }

            assert_eq!(
                result.render_path(),
                "1|2|3\n4|5|6\n0|7|8\
                 \n|\n→\n|\n\
                 1|2|3\n4|5|6\n7|0|8\
                 \n|\n→\n|\n\
                 1|2|3\n4|5|6\n7|8|0"
            );
        }
    }

    #[test]
    fn reconstruction_is_idempotent() {
        let result = GreedySearch::new(shuffled_3x3())
            .set_iteration_limit(5_000)
            .solve(Heuristic::TotalDistance);
        assert_eq!(result.reconstruct_path(), result.reconstruct_path());
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let solver = GreedySearch::new(shuffled_3x3()).set_iteration_limit(5_000);

        for heuristic in [Heuristic::OutOfPlaceCount, Heuristic::TotalDistance] {
            let first = solver.solve(heuristic);
            let second = solver.solve(heuristic);

            assert_eq!(first.is_solved(), second.is_solved());
            assert_eq!(first.iteration_count(), second.iteration_count());
            assert_eq!(first.node_count(), second.node_count());
            assert_eq!(first.reconstruct_path(), second.reconstruct_path());
            assert!(first.iteration_count() >= 1);
        }
    }

    #[test]
    fn runs_with_different_heuristics_stay_independent() {
        let solver = GreedySearch::new(shuffled_3x3()).set_iteration_limit(5_000);

        let before = solver.solve(Heuristic::OutOfPlaceCount);
        let _interleaved = solver.solve(Heuristic::TotalDistance);
        let after = solver.solve(Heuristic::OutOfPlaceCount);

        assert_eq!(before.iteration_count(), after.iteration_count());
        assert_eq!(before.node_count(), after.node_count());
        assert_eq!(before.reconstruct_path(), after.reconstruct_path());
    }

    #[test]
    fn iteration_limit_stops_after_one_cycle() {
        let result = GreedySearch::new(shuffled_3x3())
            .set_iteration_limit(1)
            .solve(Heuristic::OutOfPlaceCount);

        assert!(!result.is_solved());
        assert_eq!(result.iteration_count(), 1);
        // The limit fires before the root is expanded.
        assert_eq!(result.node_count(), 1);
        assert_eq!(result.reconstruct_path().len(), 1);
    }

    #[test]
    fn unreachable_target_exhausts_the_frontier() {
        // On a 2x2 board the tiles keep their cyclic order, so swapping two
        // adjacent tiles is unreachable and the search must run dry.
        let puzzle = TilePuzzle::new(
            2,
            2,
            state(&[&[1, 2], &[3, 0]]),
            state(&[&[2, 1], &[3, 0]]),
        )
        .unwrap();
        let result = GreedySearch::new(puzzle).solve(Heuristic::OutOfPlaceCount);

        assert!(!result.is_solved());
        assert!(result.iteration_count() >= 1);
        assert!(result.iteration_count() <= result.node_count());
        // 12 reachable states, two in-edges each: revisit suppression keeps
        // the enqueue count within 1 + 2*12.
        assert!(result.node_count() <= 25);
        assert_eq!(result.reconstruct_path()[0].0, state(&[&[1, 2], &[3, 0]]));
    }

    #[test]
    fn result_display_summarizes_the_run() {
        let result = GreedySearch::new(shuffled_3x3())
            .set_iteration_limit(1)
            .solve(Heuristic::TotalDistance);
        let summary = result.to_string();
        assert!(summary.contains("solved: false"));
        assert!(summary.contains("iterations: 1"));
    }
}
