/// The eight compass neighbors of a pixel, counter-clockwise from east.
///
/// The discriminant is the slot index inside [`AdjacencyGraph`](crate::AdjacencyGraph),
/// and the same table drives graph construction, curve traversal and the heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    East = 0,
    NorthEast = 1,
    North = 2,
    NorthWest = 3,
    West = 4,
    SouthWest = 5,
    South = 6,
    SouthEast = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::East,
        Direction::NorthEast,
        Direction::North,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
    ];

    const OFFSETS: [(isize, isize); 8] = [
        (0, 1),
        (-1, 1),
        (-1, 0),
        (-1, -1),
        (0, -1),
        (1, -1),
        (1, 0),
        (1, 1),
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// `(Δrow, Δcol)` of the neighbor in this direction.
    #[inline]
    pub fn offset(self) -> (isize, isize) {
        Self::OFFSETS[self.index()]
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        Self::ALL[(self.index() + 4) % 8]
    }

    #[inline]
    pub fn is_diagonal(self) -> bool {
        self.index() % 2 == 1
    }

    /// The diagonal direction with the given row/col signs, each of which must be `±1`.
    pub(crate) fn diagonal(dr: isize, dc: isize) -> Direction {
        match (dr < 0, dc < 0) {
            (true, false) => Direction::NorthEast,
            (true, true) => Direction::NorthWest,
            (false, true) => Direction::SouthWest,
            (false, false) => Direction::SouthEast,
        }
    }

    /// Neighbor coordinate of `(row, col)` inside a `height` x `width` grid, if any.
    #[inline]
    pub fn step(
        self,
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    ) -> Option<(usize, usize)> {
        let (dr, dc) = self.offset();
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        (r < height && c < width).then_some((r, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_offsets_cancel() {
        for d in Direction::ALL {
            let (a, b) = d.offset();
            let (c, e) = d.opposite().offset();
            assert_eq!((a + c, b + e), (0, 0), "{d:?}");
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn diagonal_lookup_matches_offsets() {
        for d in Direction::ALL.into_iter().filter(|d| d.is_diagonal()) {
            let (dr, dc) = d.offset();
            assert_eq!(Direction::diagonal(dr, dc), d);
        }
    }

    #[test]
    fn step_clips_at_borders() {
        assert_eq!(Direction::North.step(0, 0, 3, 3), None);
        assert_eq!(Direction::West.step(1, 0, 3, 3), None);
        assert_eq!(Direction::SouthEast.step(2, 1, 3, 3), None);
        assert_eq!(Direction::SouthEast.step(1, 1, 3, 3), Some((2, 2)));
        assert_eq!(Direction::NorthEast.step(1, 1, 3, 3), Some((0, 2)));
    }
}
