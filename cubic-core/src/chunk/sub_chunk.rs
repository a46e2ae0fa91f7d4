//! A 16x16x16 vertical segment of a column.

use std::fmt::Debug;
use std::sync::Arc;

use cubic_utils::{SubChunkPos, locks::SyncRwLock};

use crate::block::BlockId;
use crate::chunk::{
    block_storage::BlockStorage, entity_container::EntityContainer, light_type::LightType,
};

/// A sub-chunk: block storage plus the entities currently inside it.
///
/// The storage sits behind a shared lock so the legacy projection of the owning
/// column can hand out references to it.
#[derive(Debug)]
pub struct SubChunk {
    pos: SubChunkPos,
    storage: Arc<SyncRwLock<BlockStorage>>,
    entities: EntityContainer,
}

impl SubChunk {
    /// Creates an empty sub-chunk.
    #[must_use]
    pub fn new(pos: SubChunkPos, has_sky: bool) -> Self {
        Self::from_storage(pos, BlockStorage::new(has_sky))
    }

    /// Wraps existing block storage.
    #[must_use]
    pub fn from_storage(pos: SubChunkPos, storage: BlockStorage) -> Self {
        Self {
            pos,
            storage: Arc::new(SyncRwLock::new(storage)),
            entities: EntityContainer::new(),
        }
    }

    /// The position of this sub-chunk.
    #[must_use]
    pub fn pos(&self) -> SubChunkPos {
        self.pos
    }

    /// The vertical index.
    #[must_use]
    pub fn y(&self) -> i32 {
        self.pos.y
    }

    /// Shared handle to the block storage.
    #[must_use]
    pub fn storage(&self) -> &Arc<SyncRwLock<BlockStorage>> {
        &self.storage
    }

    /// Gets the block at the given local position.
    #[must_use]
    pub fn block(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.storage.read().block(x, y, z)
    }

    /// Writes a block and its metadata, returning true if either changed.
    ///
    /// No lighting or neighbour updates happen here, the owning column runs those.
    pub fn set_block(&self, x: usize, y: usize, z: usize, id: BlockId, metadata: u8) -> bool {
        let mut storage = self.storage.write();
        let previous = storage.set_block(x, y, z, id);
        let metadata_changed = storage.set_metadata(x, y, z, metadata);
        previous != id || metadata_changed
    }

    /// Gets the metadata at the given local position.
    #[must_use]
    pub fn metadata(&self, x: usize, y: usize, z: usize) -> u8 {
        self.storage.read().metadata(x, y, z)
    }

    /// Sets the metadata, returning true if it changed.
    pub fn set_metadata(&self, x: usize, y: usize, z: usize, value: u8) -> bool {
        self.storage.write().set_metadata(x, y, z, value)
    }

    /// Gets a light value.
    #[must_use]
    pub fn light(&self, kind: LightType, x: usize, y: usize, z: usize) -> u8 {
        self.storage.read().light(kind, x, y, z)
    }

    /// Sets a light value.
    pub fn set_light(&self, kind: LightType, x: usize, y: usize, z: usize, value: u8) {
        self.storage.write().set_light(kind, x, y, z, value);
    }

    /// Returns true if any voxel holds a non-air block.
    #[must_use]
    pub fn has_blocks(&self) -> bool {
        self.storage.read().has_blocks()
    }

    /// Entities inside this sub-chunk.
    #[must_use]
    pub fn entities(&self) -> &EntityContainer {
        &self.entities
    }

    /// Mutable access to the entities inside this sub-chunk.
    pub fn entities_mut(&mut self) -> &mut EntityContainer {
        &mut self.entities
    }
}

/// Creates the sub-chunks a column allocates lazily.
pub trait SubChunkFactory: Debug + Send + Sync {
    /// Creates an empty sub-chunk for the given column and vertical index.
    fn create(&self, column_x: i32, y: i32, column_z: i32, has_sky: bool) -> SubChunk;
}

/// Factory producing all-air sub-chunks with zero light.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySubChunkFactory;

impl SubChunkFactory for EmptySubChunkFactory {
    fn create(&self, column_x: i32, y: i32, column_z: i32, has_sky: bool) -> SubChunk {
        SubChunk::new(SubChunkPos::new(column_x, y, column_z), has_sky)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_block_reports_changes() {
        let sub_chunk = EmptySubChunkFactory.create(0, 3, 0, true);
        assert_eq!(sub_chunk.pos(), SubChunkPos::new(0, 3, 0));

        assert!(sub_chunk.set_block(1, 1, 1, BlockId(5), 0));
        assert!(!sub_chunk.set_block(1, 1, 1, BlockId(5), 0));
        assert!(sub_chunk.set_block(1, 1, 1, BlockId(5), 2));
        assert_eq!(sub_chunk.metadata(1, 1, 1), 2);
        assert!(sub_chunk.has_blocks());
    }

    #[test]
    fn test_storage_is_shared() {
        let sub_chunk = SubChunk::new(SubChunkPos::new(0, 0, 0), true);
        let handle = Arc::clone(sub_chunk.storage());
        sub_chunk.set_block(2, 2, 2, BlockId(9), 0);
        assert_eq!(handle.read().block(2, 2, 2), BlockId(9));
    }
}
