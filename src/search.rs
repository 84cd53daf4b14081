use nonmax::NonMaxUsize;

use crate::problems::tile_puzzle::Direction;
use crate::problems::tile_puzzle::GridState;

/// A reference to a `SearchTreeNode` in its arena.
///
/// Backed by `NonMaxUsize` so the parent link `Option<(SearchTreeIndex, _)>`
/// costs no extra space.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchTreeIndex(NonMaxUsize);

impl SearchTreeIndex {
    #[inline(always)]
    fn new(index: usize) -> Self {
        Self(NonMaxUsize::new(index).unwrap())
    }

    #[inline(always)]
    fn get(self) -> usize {
        self.0.get()
    }
}

/// A node of the search tree: the state it represents, its heuristic value,
/// and the move that reached it from its parent (absent only for the root).
///
/// The parent link is used solely for path reconstruction; nodes are never
/// merged, so the arena always forms a tree.
#[derive(Debug)]
pub struct SearchTreeNode {
    pub(crate) parent: Option<(SearchTreeIndex, Direction)>,
    state: GridState,
    h: u32,
}

impl SearchTreeNode {
    pub fn new(state: GridState, h: u32, parent: Option<(SearchTreeIndex, Direction)>) -> Self {
        Self { parent, state, h }
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }
    pub fn heuristic_value(&self) -> u32 {
        self.h
    }
    /// The blank move that produced this node, `None` for the root.
    pub fn direction(&self) -> Option<Direction> {
        self.parent.map(|(_, direction)| direction)
    }
}

/// An append-only arena of search nodes addressed by `SearchTreeIndex`.
///
/// Indices are never reused within one search run.
#[derive(Default)]
pub struct SearchTree {
    nodes: Vec<SearchTreeNode>,
}

impl SearchTree {
    #[inline(always)]
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    #[inline(always)]
    pub fn push(&mut self, node: SearchTreeNode) -> SearchTreeIndex {
        let index = SearchTreeIndex::new(self.nodes.len());
        self.nodes.push(node);
        index
    }

    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reconstructs the path from the root to `terminal` by walking parent
    /// links backwards, then reversing.
    ///
    /// Every entry pairs a defensive clone of the node's state with the move
    /// that produced it (`None` for the root).
    #[must_use]
    pub fn path(&self, terminal: SearchTreeIndex) -> Vec<(GridState, Option<Direction>)> {
        let mut steps = Vec::new();
        let mut index = terminal;

        loop {
            let node = &self[index];
            steps.push((node.state().clone(), node.direction()));
            match node.parent {
                Some((parent_index, _)) => {
                    debug_assert!(parent_index != index);
                    index = parent_index;
                }
                None => break,
            }
        }

        steps.reverse();
        steps
    }
}

impl std::ops::Index<SearchTreeIndex> for SearchTree {
    type Output = SearchTreeNode;

    #[inline(always)]
    fn index(&self, index: SearchTreeIndex) -> &Self::Output {
        &self.nodes[index.get()]
    }
}

impl std::fmt::Debug for SearchTree {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "SearchTree{{({} nodes)}}", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(cells: &[&[u32]]) -> GridState {
        GridState::new(cells.iter().map(|line| line.to_vec()).collect())
    }

    #[test]
    fn path_walks_parent_links_in_order() {
        let mut tree = SearchTree::new();

        let root_state = state(&[&[1, 2], &[0, 3]]);
        let mid_state = state(&[&[1, 2], &[3, 0]]);
        let end_state = state(&[&[1, 0], &[3, 2]]);

        let root = tree.push(SearchTreeNode::new(root_state.clone(), 2, None));
        let mid = tree.push(SearchTreeNode::new(
            mid_state.clone(),
            1,
            Some((root, Direction::Right)),
        ));
        let end = tree.push(SearchTreeNode::new(
            end_state.clone(),
            0,
            Some((mid, Direction::Up)),
        ));
        assert_eq!(tree.len(), 3);

        let path = tree.path(end);
        assert_eq!(
            path,
            vec![
                (root_state, None),
                (mid_state, Some(Direction::Right)),
                (end_state, Some(Direction::Up)),
            ]
        );

        // A root-only path is just the root.
        assert_eq!(tree.path(root).len(), 1);
    }

    #[test]
    fn nodes_keep_their_heuristic_value() {
        let mut tree = SearchTree::new();
        let index = tree.push(SearchTreeNode::new(state(&[&[0, 1]]), 4, None));
        assert_eq!(tree[index].heuristic_value(), 4);
        assert_eq!(tree[index].direction(), None);
    }
}
