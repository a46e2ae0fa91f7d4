//! Budgeted round-robin recheck of light sources next to empty blocks.
//!
//! Rechecking every block column of a column each tick is too expensive, so a cursor
//! walks the flattened `(sub-chunk, x, z)` address space a few block columns at a
//! time. Every resident block column gets visited once per cycle.

use cubic_utils::{BlockPos, ColumnPos, coords};

use crate::chunk::{direction::Direction, sub_chunk_index::SubChunkIndex};
use crate::world::BlockAccess;

/// Block columns checked per pass.
pub const CHECKS_PER_PASS: u32 = 8;

/// Largest snapshot the 8-bit sub-chunk field can address.
pub const MAX_SNAPSHOT_LEN: usize = 256;

/// A cursor value split into its fields.
///
/// Bit layout of the encoded form:
/// ```text
/// Bit Position:  15 ............ 8  7 ..... 4  3 ..... 0
///                |   sub-chunk    |  local x  | local z |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelightAddress {
    /// Index into the snapshot, not the vertical index.
    pub sub_chunk: u8,
    /// Local x, 0-15.
    pub local_x: u8,
    /// Local z, 0-15.
    pub local_z: u8,
}

impl RelightAddress {
    const NIBBLE_MASK: u32 = 0x0F;
    const SUB_CHUNK_MASK: u32 = 0xFF;

    /// Packs the address into a cursor value.
    #[must_use]
    pub const fn encode(self) -> u32 {
        (self.sub_chunk as u32) << 8
            | (self.local_x as u32 & Self::NIBBLE_MASK) << 4
            | (self.local_z as u32 & Self::NIBBLE_MASK)
    }

    /// Splits a cursor value. Bits above 15 are ignored.
    #[must_use]
    pub const fn decode(cursor: u32) -> Self {
        Self {
            sub_chunk: ((cursor >> 8) & Self::SUB_CHUNK_MASK) as u8,
            local_x: ((cursor >> 4) & Self::NIBBLE_MASK) as u8,
            local_z: (cursor & Self::NIBBLE_MASK) as u8,
        }
    }
}

/// Per-column relight cursor.
#[derive(Debug, Clone, Default)]
pub struct RelightScheduler {
    cursor: u32,
    /// Vertical indices of the sub-chunks being cycled over, bottom to top.
    snapshot: Vec<i32>,
}

impl RelightScheduler {
    /// Creates a scheduler with an empty snapshot, taken on the first pass.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-snapshots the resident sub-chunks and rewinds the cursor.
    ///
    /// Only the lowest 256 sub-chunks fit the address space.
    pub fn reset(&mut self, sub_chunks: &SubChunkIndex) {
        self.cursor = 0;
        self.snapshot.clear();
        self.snapshot
            .extend(sub_chunks.ys().take(MAX_SNAPSHOT_LEN));
    }

    /// Drops the snapshot so the next pass takes a fresh one.
    pub fn invalidate(&mut self) {
        self.cursor = 0;
        self.snapshot.clear();
    }

    /// The current cursor value.
    #[must_use]
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Number of sub-chunks in the snapshot.
    #[must_use]
    pub fn snapshot_len(&self) -> usize {
        self.snapshot.len()
    }

    /// Returns true once every block column of the snapshot was checked.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.limit()
    }

    fn limit(&self) -> u32 {
        16 * 16 * self.snapshot.len() as u32
    }

    /// Runs up to [`CHECKS_PER_PASS`] block column checks.
    ///
    /// For every air block in a checked block column, each face neighbour that emits
    /// light is pushed to `requests`, followed by the air block itself. Does nothing
    /// once the cursor is exhausted; an empty snapshot is retaken first.
    pub fn run_pass(
        &mut self,
        column: ColumnPos,
        sub_chunks: &SubChunkIndex,
        world: &impl BlockAccess,
        requests: &mut Vec<BlockPos>,
    ) {
        if self.snapshot.is_empty() {
            self.reset(sub_chunks);
        }

        for _ in 0..CHECKS_PER_PASS {
            if self.is_exhausted() {
                return;
            }

            let address = RelightAddress::decode(self.cursor);
            self.cursor += 1;

            let sub_chunk_y = self.snapshot[usize::from(address.sub_chunk)];
            // removed since the snapshot was taken
            let Some(sub_chunk) = sub_chunks.get(sub_chunk_y) else {
                continue;
            };

            let local_x = usize::from(address.local_x);
            let local_z = usize::from(address.local_z);
            for local_y in 0..16 {
                if !sub_chunk.block(local_x, local_y, local_z).is_air() {
                    continue;
                }

                let pos = column.block_at(
                    local_x,
                    coords::local_to_block(sub_chunk_y, local_y),
                    local_z,
                );
                for dir in Direction::ALL {
                    let neighbour = dir.relative(pos);
                    if world.light_emission_at(neighbour) > 0 {
                        requests.push(neighbour);
                    }
                }
                requests.push(pos);
            }
        }
    }
}
