//! Raw voxel storage of one 16x16x16 sub-chunk.

use crate::block::{BlockId, BlockRegistry};
use crate::chunk::light_type::LightType;
use crate::chunk::nibble_array::NibbleArray;

/// Voxels per sub-chunk.
pub const BLOCKS_PER_SUB_CHUNK: usize = 4096;

#[inline]
const fn index(x: usize, y: usize, z: usize) -> usize {
    y << 8 | z << 4 | x
}

/// Block ids, metadata and light for one sub-chunk.
///
/// Every array is allocated on creation; only the high id bits and sky light are
/// optional, the first because most ids fit in a byte and the second because worlds
/// without a sky never store it.
#[derive(Debug, Clone)]
pub struct BlockStorage {
    block_lsb: Box<[u8; BLOCKS_PER_SUB_CHUNK]>,
    block_msb: Option<NibbleArray>,
    metadata: NibbleArray,
    block_light: NibbleArray,
    sky_light: Option<NibbleArray>,
    non_air_count: u16,
}

impl BlockStorage {
    /// Creates storage full of air with zero light.
    #[must_use]
    pub fn new(has_sky: bool) -> Self {
        Self {
            block_lsb: Box::new([0; BLOCKS_PER_SUB_CHUNK]),
            block_msb: None,
            metadata: NibbleArray::new_empty(),
            block_light: NibbleArray::new_empty(),
            sky_light: has_sky.then(NibbleArray::new_empty),
            non_air_count: 0,
        }
    }

    /// Gets the block at the given local position.
    #[must_use]
    pub fn block(&self, x: usize, y: usize, z: usize) -> BlockId {
        let low = self.block_lsb[index(x, y, z)];
        let high = self.block_msb.as_ref().map_or(0, |msb| msb.get(x, y, z));
        BlockId::from_parts(low, high)
    }

    /// Sets the block at the given local position, returning the previous one.
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, id: BlockId) -> BlockId {
        let previous = self.block(x, y, z);
        if previous == id {
            return previous;
        }

        match (previous.is_air(), id.is_air()) {
            (true, false) => self.non_air_count += 1,
            (false, true) => self.non_air_count -= 1,
            _ => {}
        }

        self.block_lsb[index(x, y, z)] = id.low();
        if id.high() != 0 {
            self.block_msb
                .get_or_insert_with(NibbleArray::new_empty)
                .set(x, y, z, id.high());
        } else if let Some(msb) = &mut self.block_msb {
            msb.set(x, y, z, 0);
        }

        previous
    }

    /// Gets the metadata nibble at the given local position.
    #[must_use]
    pub fn metadata(&self, x: usize, y: usize, z: usize) -> u8 {
        self.metadata.get(x, y, z)
    }

    /// Sets the metadata nibble, returning true if it changed.
    pub fn set_metadata(&mut self, x: usize, y: usize, z: usize, value: u8) -> bool {
        let value = value & 0x0F;
        if self.metadata.get(x, y, z) == value {
            return false;
        }
        self.metadata.set(x, y, z, value);
        true
    }

    /// Gets a light value. Sky light reads 0 when the world has no sky.
    #[must_use]
    pub fn light(&self, kind: LightType, x: usize, y: usize, z: usize) -> u8 {
        match kind {
            LightType::Block => self.block_light.get(x, y, z),
            LightType::Sky => self.sky_light.as_ref().map_or(0, |sky| sky.get(x, y, z)),
        }
    }

    /// Sets a light value. Sky light writes are dropped when the world has no sky.
    pub fn set_light(&mut self, kind: LightType, x: usize, y: usize, z: usize, value: u8) {
        match kind {
            LightType::Block => self.block_light.set(x, y, z, value),
            LightType::Sky => {
                if let Some(sky) = &mut self.sky_light {
                    sky.set(x, y, z, value);
                }
            }
        }
    }

    /// Returns true if any voxel holds a non-air block.
    #[must_use]
    pub fn has_blocks(&self) -> bool {
        self.non_air_count > 0
    }

    /// Number of non-air voxels.
    #[must_use]
    pub fn non_air_count(&self) -> u16 {
        self.non_air_count
    }

    /// Replaces every id the registry does not know with air and recounts.
    ///
    /// Needed after raw arrays were filled from a snapshot.
    pub fn remove_invalid_blocks(&mut self, registry: &impl BlockRegistry) {
        let mut count = 0u16;
        for y in 0..16 {
            for z in 0..16 {
                for x in 0..16 {
                    let id = self.block(x, y, z);
                    if id.is_air() {
                        continue;
                    }
                    if registry.is_valid(id) {
                        count += 1;
                    } else {
                        self.block_lsb[index(x, y, z)] = 0;
                        if let Some(msb) = &mut self.block_msb {
                            msb.set(x, y, z, 0);
                        }
                    }
                }
            }
        }
        self.non_air_count = count;

        if self.block_msb.as_ref().is_some_and(NibbleArray::is_zero) {
            self.block_msb = None;
        }
    }

    /// Low id bytes in `y << 8 | z << 4 | x` order.
    #[must_use]
    pub fn block_lsb(&self) -> &[u8; BLOCKS_PER_SUB_CHUNK] {
        &self.block_lsb
    }

    /// Mutable low id bytes. Call [`BlockStorage::remove_invalid_blocks`] afterwards.
    pub fn block_lsb_mut(&mut self) -> &mut [u8; BLOCKS_PER_SUB_CHUNK] {
        &mut self.block_lsb
    }

    /// High id nibbles, absent while every id fits in a byte.
    #[must_use]
    pub fn block_msb(&self) -> Option<&NibbleArray> {
        self.block_msb.as_ref()
    }

    /// Replaces the high id nibbles.
    pub fn set_block_msb(&mut self, msb: Option<NibbleArray>) {
        self.block_msb = msb;
    }

    /// The metadata array.
    #[must_use]
    pub fn metadata_array(&self) -> &NibbleArray {
        &self.metadata
    }

    /// Replaces the metadata array.
    pub fn set_metadata_array(&mut self, metadata: NibbleArray) {
        self.metadata = metadata;
    }

    /// The block light array.
    #[must_use]
    pub fn block_light_array(&self) -> &NibbleArray {
        &self.block_light
    }

    /// Replaces the block light array.
    pub fn set_block_light_array(&mut self, light: NibbleArray) {
        self.block_light = light;
    }

    /// The sky light array, absent in worlds without a sky.
    #[must_use]
    pub fn sky_light_array(&self) -> Option<&NibbleArray> {
        self.sky_light.as_ref()
    }

    /// Replaces the sky light array.
    pub fn set_sky_light_array(&mut self, light: Option<NibbleArray>) {
        self.sky_light = light;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockProperties, BlockTable};

    #[test]
    fn test_counts_non_air() {
        let mut storage = BlockStorage::new(true);
        assert!(!storage.has_blocks());

        storage.set_block(1, 2, 3, BlockId(1));
        storage.set_block(1, 2, 4, BlockId(1));
        storage.set_block(1, 2, 4, BlockId(2));
        assert_eq!(storage.non_air_count(), 2);

        storage.set_block(1, 2, 3, BlockId::AIR);
        assert_eq!(storage.non_air_count(), 1);
        assert_eq!(storage.block(1, 2, 4), BlockId(2));
    }

    #[test]
    fn test_high_ids_allocate_msb() {
        let mut storage = BlockStorage::new(true);
        storage.set_block(0, 0, 0, BlockId(0x1FF));
        assert!(storage.block_msb().is_some());
        assert_eq!(storage.block(0, 0, 0), BlockId(0x1FF));
        assert_eq!(storage.block_lsb()[0], 0xFF);

        storage.set_block(0, 0, 0, BlockId(0x0FF));
        assert_eq!(storage.block(0, 0, 0), BlockId(0x0FF));
    }

    #[test]
    fn test_light_without_sky() {
        let mut storage = BlockStorage::new(false);
        storage.set_light(LightType::Sky, 0, 0, 0, 15);
        storage.set_light(LightType::Block, 0, 0, 0, 7);
        assert_eq!(storage.light(LightType::Sky, 0, 0, 0), 0);
        assert_eq!(storage.light(LightType::Block, 0, 0, 0), 7);
        assert!(storage.sky_light_array().is_none());
    }

    #[test]
    fn test_remove_invalid_blocks() {
        let mut table = BlockTable::new();
        let stone = table.register("stone", BlockProperties::OPAQUE);
        let stone = stone.unwrap_or(BlockId(1));

        let mut storage = BlockStorage::new(true);
        storage.block_lsb_mut()[0] = stone.low();
        storage.block_lsb_mut()[1] = 200;
        storage.set_block_msb(Some(NibbleArray::new_filled(0)));
        storage.remove_invalid_blocks(&table);

        assert_eq!(storage.block(0, 0, 0), stone);
        assert_eq!(storage.block(1, 0, 0), BlockId::AIR);
        assert_eq!(storage.non_air_count(), 1);
        assert!(storage.block_msb().is_none());
    }
}
