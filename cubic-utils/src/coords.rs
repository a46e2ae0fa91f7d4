//! Conversions between block, sub-chunk and local coordinates.
//!
//! A sub-chunk spans 16 blocks on every axis, so every conversion is a shift or a
//! mask. Shifts on signed values floor towards negative infinity, which keeps
//! negative coordinates in the right sub-chunk.

/// Blocks per sub-chunk edge.
pub const SUB_CHUNK_SIZE: i32 = 16;

/// `log2(SUB_CHUNK_SIZE)`.
pub const SUB_CHUNK_BITS: u32 = 4;

const LOCAL_MASK: i32 = SUB_CHUNK_SIZE - 1;

/// The sub-chunk (or column) index holding the given block coordinate.
#[must_use]
#[inline]
pub const fn block_to_sub_chunk(block: i32) -> i32 {
    block >> SUB_CHUNK_BITS
}

/// The coordinate of a block inside its sub-chunk, in `0..16`.
#[must_use]
#[inline]
pub const fn block_to_local(block: i32) -> usize {
    (block & LOCAL_MASK) as usize
}

/// The world coordinate of a local coordinate inside the given sub-chunk.
#[must_use]
#[inline]
pub const fn local_to_block(sub_chunk: i32, local: usize) -> i32 {
    (sub_chunk << SUB_CHUNK_BITS) + local as i32
}

/// The lowest world coordinate inside the given sub-chunk.
#[must_use]
#[inline]
pub const fn sub_chunk_to_min_block(sub_chunk: i32) -> i32 {
    sub_chunk << SUB_CHUNK_BITS
}

/// The highest world coordinate inside the given sub-chunk.
#[must_use]
#[inline]
pub const fn sub_chunk_to_max_block(sub_chunk: i32) -> i32 {
    sub_chunk_to_min_block(sub_chunk) + LOCAL_MASK
}

/// The sub-chunk an entity at the given height belongs to.
#[must_use]
pub fn sub_chunk_for_height(y: f64) -> i32 {
    block_to_sub_chunk(y.floor() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_coordinates() {
        assert_eq!(block_to_sub_chunk(0), 0);
        assert_eq!(block_to_sub_chunk(15), 0);
        assert_eq!(block_to_sub_chunk(16), 1);
        assert_eq!(block_to_local(17), 1);
        assert_eq!(local_to_block(1, 1), 17);
    }

    #[test]
    fn test_negative_coordinates_floor() {
        assert_eq!(block_to_sub_chunk(-1), -1);
        assert_eq!(block_to_sub_chunk(-16), -1);
        assert_eq!(block_to_sub_chunk(-17), -2);
        assert_eq!(block_to_local(-1), 15);
        assert_eq!(local_to_block(-1, 15), -1);
        assert_eq!(sub_chunk_to_min_block(-2), -32);
        assert_eq!(sub_chunk_to_max_block(-2), -17);
    }

    #[test]
    fn test_entity_height() {
        assert_eq!(sub_chunk_for_height(15.9), 0);
        assert_eq!(sub_chunk_for_height(-0.5), -1);
        assert_eq!(sub_chunk_for_height(64.0), 4);
    }
}
