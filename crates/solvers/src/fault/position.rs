//! Position arithmetic for the claim tree. A position is a generalized index: the root is `1`,
//! and the children of `p` are `2p` (attack) and `2p + 1` (defend).

/// Navigation and trace mapping for a node of the claim tree.
pub trait Position {
    /// Number of edges between the root and this node.
    fn depth(&self) -> u64;
    /// Offset of this node from the leftmost node on its level.
    fn index_at_depth(&self) -> u64;
    /// The child an attack lands on.
    fn left(&self) -> Self;
    /// The child a defend lands on.
    fn right(&self) -> Self;
    fn parent(&self) -> Self;
    /// `true` for the defend child of a parent. The root is not a right child.
    fn right_of(&self) -> bool;
    /// The right-most descendant of this node on the `max_depth` level.
    fn right_index(&self, max_depth: u64) -> Self;
    /// The trace index a claim at this node commits to: the index at depth of its right-most
    /// descendant leaf.
    fn trace_index(&self, max_depth: u64) -> u64;
    /// The node an attack (`true`) or defend (`false`) against this node creates.
    fn make_move(&self, is_attack: bool) -> Self;
}

/// Builds the position at `index_at_depth` on level `depth`, i.e. `2^depth + index_at_depth`.
pub fn compute_gindex(depth: u8, index_at_depth: u64) -> u128 {
    (1u128 << depth) + index_at_depth as u128
}

impl Position for u128 {
    fn depth(&self) -> u64 {
        127 - self.leading_zeros() as u64
    }

    fn index_at_depth(&self) -> u64 {
        (self - (1 << self.depth())) as u64
    }

    fn left(&self) -> Self {
        self << 1
    }

    fn right(&self) -> Self {
        self.left() | 1
    }

    fn parent(&self) -> Self {
        self >> 1
    }

    fn right_of(&self) -> bool {
        *self > 1 && self & 1 == 1
    }

    fn right_index(&self, max_depth: u64) -> Self {
        let remaining = max_depth - self.depth();
        (self << remaining) | ((1 << remaining) - 1)
    }

    fn trace_index(&self, max_depth: u64) -> u64 {
        self.right_index(max_depth).index_at_depth()
    }

    fn make_move(&self, is_attack: bool) -> Self {
        if is_attack {
            self.left()
        } else {
            self.right()
        }
    }
}

#[cfg(test)]
mod test {
    use super::{compute_gindex, Position};

    const MAX_DEPTH: u64 = 4;

    /// `(depth, index_at_depth, right_index, trace_index)` for positions `1..32`, in order.
    const DEPTH_FOUR_TREE: &[(u64, u64, u128, u64)] = &[
        (0, 0, 31, 15),
        (1, 0, 23, 7),
        (1, 1, 31, 15),
        (2, 0, 19, 3),
        (2, 1, 23, 7),
        (2, 2, 27, 11),
        (2, 3, 31, 15),
        (3, 0, 17, 1),
        (3, 1, 19, 3),
        (3, 2, 21, 5),
        (3, 3, 23, 7),
        (3, 4, 25, 9),
        (3, 5, 27, 11),
        (3, 6, 29, 13),
        (3, 7, 31, 15),
        (4, 0, 16, 0),
        (4, 1, 17, 1),
        (4, 2, 18, 2),
        (4, 3, 19, 3),
        (4, 4, 20, 4),
        (4, 5, 21, 5),
        (4, 6, 22, 6),
        (4, 7, 23, 7),
        (4, 8, 24, 8),
        (4, 9, 25, 9),
        (4, 10, 26, 10),
        (4, 11, 27, 11),
        (4, 12, 28, 12),
        (4, 13, 29, 13),
        (4, 14, 30, 14),
        (4, 15, 31, 15),
    ];

    #[test]
    fn depth_four_tree_layout() {
        for (i, &(depth, index_at_depth, right_index, trace_index)) in
            DEPTH_FOUR_TREE.iter().enumerate()
        {
            let pos = i as u128 + 1;
            assert_eq!(pos.depth(), depth);
            assert_eq!(pos.index_at_depth(), index_at_depth);
            assert_eq!(pos.right_index(MAX_DEPTH), right_index);
            assert_eq!(pos.trace_index(MAX_DEPTH), trace_index);
        }
    }

    #[test]
    fn children_point_back_to_parent() {
        for pos in 1u128..(1 << (MAX_DEPTH + 1)) {
            assert_eq!(pos.left().parent(), pos);
            assert_eq!(pos.right().parent(), pos);
            assert!(!pos.left().right_of());
            assert!(pos.right().right_of());
            assert_eq!(pos.left().depth(), pos.depth() + 1);
        }
    }

    #[test]
    fn moves_bisect_into_children() {
        assert_eq!(1u128.make_move(true), 2);
        assert_eq!(1u128.make_move(false), 3);
        assert_eq!(5u128.make_move(true), 10);
        assert_eq!(5u128.make_move(false), 11);
        assert!(!1u128.right_of());
    }

    #[test]
    fn gindex_round_trips_depth_and_index() {
        let pos = compute_gindex(4, 9);
        assert_eq!(pos, 25);
        assert_eq!(pos.depth(), 4);
        assert_eq!(pos.index_at_depth(), 9);
    }

    #[test]
    fn root_commits_to_last_index_at_max_depth_64() {
        assert_eq!(1u128.trace_index(64), u64::MAX);
        assert_eq!(2u128.trace_index(64), u64::MAX >> 1);
        assert_eq!(compute_gindex(64, 0).trace_index(64), 0);
    }
}
