//! Ring neighbor arithmetic.

pub type Rank = usize;

/// The two logical neighbors of a participant in a ring of `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    pub left: Rank,
    pub right: Rank,
}

impl Neighbors {
    /// Derive both neighbors from a rank and the group size.
    ///
    /// `size` must be non-zero and `rank < size`.
    pub fn of(rank: Rank, size: usize) -> Self {
        debug_assert!(rank < size, "rank {} outside group of {}", rank, size);
        Self {
            left: (rank + size - 1) % size,
            right: (rank + 1) % size,
        }
    }

    /// True when the participant is its own neighbor (a ring of one).
    pub fn is_self(&self, rank: Rank) -> bool {
        self.left == rank && self.right == rank
    }
}
