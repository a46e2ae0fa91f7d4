//! Wrapper types making it harder to accidentaly use the wrong underlying type.

use std::fmt::{self, Display};

use crate::coords;

/// A block position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPos {
    /// World x coordinate.
    pub x: i32,
    /// World y coordinate (unbounded in both directions).
    pub y: i32,
    /// World z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Creates a new block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns this position moved by the given deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The column this block belongs to.
    #[must_use]
    pub const fn column(self) -> ColumnPos {
        ColumnPos::new(
            coords::block_to_sub_chunk(self.x),
            coords::block_to_sub_chunk(self.z),
        )
    }

    /// The sub-chunk this block belongs to.
    #[must_use]
    pub const fn sub_chunk(self) -> SubChunkPos {
        SubChunkPos::new(
            coords::block_to_sub_chunk(self.x),
            coords::block_to_sub_chunk(self.y),
            coords::block_to_sub_chunk(self.z),
        )
    }

    /// The position of this block inside its column, as `(local_x, y, local_z)`.
    #[must_use]
    pub const fn column_local(self) -> (usize, i32, usize) {
        (
            coords::block_to_local(self.x),
            self.y,
            coords::block_to_local(self.z),
        )
    }
}

impl Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A column position, the horizontal 16x16 footprint of unbounded height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColumnPos {
    /// Column x coordinate.
    pub x: i32,
    /// Column z coordinate.
    pub z: i32,
}

impl ColumnPos {
    /// Creates a new column position.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Packs the position into a single `i64`, x in the low half.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        (self.x as u32 as i64) | ((self.z as u32 as i64) << 32)
    }

    /// Unpacks a position packed with [`ColumnPos::as_i64`].
    #[must_use]
    pub const fn from_i64(packed: i64) -> Self {
        Self::new(packed as i32, (packed >> 32) as i32)
    }

    /// World x of the column's first block.
    #[must_use]
    pub const fn min_block_x(self) -> i32 {
        coords::sub_chunk_to_min_block(self.x)
    }

    /// World z of the column's first block.
    #[must_use]
    pub const fn min_block_z(self) -> i32 {
        coords::sub_chunk_to_min_block(self.z)
    }

    /// Converts a column local position into a world position.
    #[must_use]
    pub const fn block_at(self, local_x: usize, y: i32, local_z: usize) -> BlockPos {
        BlockPos::new(
            coords::local_to_block(self.x, local_x),
            y,
            coords::local_to_block(self.z, local_z),
        )
    }
}

impl Display for ColumnPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.z)
    }
}

/// A sub-chunk position: column coordinates plus the vertical sub-chunk index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SubChunkPos {
    /// Column x coordinate.
    pub x: i32,
    /// Vertical sub-chunk index.
    pub y: i32,
    /// Column z coordinate.
    pub z: i32,
}

impl SubChunkPos {
    /// Creates a new sub-chunk position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The column holding this sub-chunk.
    #[must_use]
    pub const fn column(self) -> ColumnPos {
        ColumnPos::new(self.x, self.z)
    }

    /// World y of the sub-chunk's lowest block layer.
    #[must_use]
    pub const fn min_block_y(self) -> i32 {
        coords::sub_chunk_to_min_block(self.y)
    }
}

impl Display for SubChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}
