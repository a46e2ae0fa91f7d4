//! Face directions used when checking block neighbours.

use cubic_utils::BlockPos;

/// The six faces of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// -Y
    Down,
    /// +Y
    Up,
    /// -Z
    North,
    /// +Z
    South,
    /// -X
    West,
    /// +X
    East,
}

impl Direction {
    /// All six directions, vertical first.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// The four directions that stay in the same horizontal layer.
    pub const HORIZONTAL: [Direction; 4] = [
        Direction::West,
        Direction::East,
        Direction::North,
        Direction::South,
    ];

    /// Returns `(dx, dy, dz)` for this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Self::Down => (0, -1, 0),
            Self::Up => (0, 1, 0),
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::West => (-1, 0, 0),
            Self::East => (1, 0, 0),
        }
    }

    /// The neighbour of `pos` in this direction.
    #[must_use]
    pub const fn relative(self, pos: BlockPos) -> BlockPos {
        let (dx, dy, dz) = self.offset();
        pos.offset(dx, dy, dz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_cancel_out() {
        let origin = BlockPos::new(3, -7, 11);
        let sum = Direction::ALL.iter().fold((0, 0, 0), |acc, dir| {
            let (dx, dy, dz) = dir.offset();
            (acc.0 + dx, acc.1 + dy, acc.2 + dz)
        });
        assert_eq!(sum, (0, 0, 0));
        assert_eq!(Direction::Up.relative(origin), BlockPos::new(3, -6, 11));
    }

    #[test]
    fn test_horizontal_stays_in_layer() {
        for dir in Direction::HORIZONTAL {
            assert_eq!(dir.offset().1, 0);
        }
    }
}
