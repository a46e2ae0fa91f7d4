//! World-wide state the column lighting code reads and feeds.

use cubic_utils::{BlockPos, ColumnPos, SubChunkPos, XyzMap, XyzMapError, coords};
use rustc_hash::FxHashSet;

use crate::chunk::light_type::LightType;
use crate::world::{
    WorldContext,
    light_queue::{LightUpdate, LightUpdateQueue},
};

/// Tracks loaded columns and resident sub-chunks and collects light work.
#[derive(Debug)]
pub struct LightContext {
    has_sky: bool,
    loaded_columns: FxHashSet<ColumnPos>,
    sub_chunks: XyzMap<SubChunkPos>,
    queue: LightUpdateQueue,
}

impl LightContext {
    /// Creates an empty context.
    ///
    /// `load_factor` and `capacity` configure the world-wide sub-chunk map.
    pub fn new(has_sky: bool, load_factor: f32, capacity: usize) -> Result<Self, XyzMapError> {
        Ok(Self {
            has_sky,
            loaded_columns: FxHashSet::default(),
            sub_chunks: XyzMap::new(load_factor, capacity)?,
            queue: LightUpdateQueue::new(),
        })
    }

    /// Records a column as loaded.
    pub fn mark_column_loaded(&mut self, pos: ColumnPos) {
        self.loaded_columns.insert(pos);
    }

    /// Forgets a loaded column.
    pub fn mark_column_unloaded(&mut self, pos: ColumnPos) {
        self.loaded_columns.remove(&pos);
    }

    /// Whether the column is loaded.
    #[must_use]
    pub fn is_column_loaded(&self, pos: ColumnPos) -> bool {
        self.loaded_columns.contains(&pos)
    }

    /// Number of loaded columns.
    #[must_use]
    pub fn loaded_column_count(&self) -> usize {
        self.loaded_columns.len()
    }

    /// Whether a sub-chunk is resident anywhere in the world.
    #[must_use]
    pub fn is_sub_chunk_resident(&self, pos: SubChunkPos) -> bool {
        self.sub_chunks.contains(pos.x, pos.y, pos.z)
    }

    /// The world-wide map of resident sub-chunks.
    #[must_use]
    pub fn resident_sub_chunks(&self) -> &XyzMap<SubChunkPos> {
        &self.sub_chunks
    }

    /// The pending light work.
    #[must_use]
    pub fn queue(&self) -> &LightUpdateQueue {
        &self.queue
    }

    /// Takes every pending light update.
    pub fn drain_updates(&mut self) -> Vec<LightUpdate> {
        self.queue.drain()
    }
}

impl WorldContext for LightContext {
    fn has_sky(&self) -> bool {
        self.has_sky
    }

    fn is_area_loaded(&self, center: BlockPos, radius: i32) -> bool {
        let min_x = coords::block_to_sub_chunk(center.x - radius);
        let max_x = coords::block_to_sub_chunk(center.x + radius);
        let min_z = coords::block_to_sub_chunk(center.z - radius);
        let max_z = coords::block_to_sub_chunk(center.z + radius);

        (min_x..=max_x).all(|x| {
            (min_z..=max_z).all(|z| self.loaded_columns.contains(&ColumnPos::new(x, z)))
        })
    }

    fn on_sub_chunk_created(&mut self, pos: SubChunkPos) {
        self.sub_chunks.put(pos);
    }

    fn on_sub_chunk_removed(&mut self, pos: SubChunkPos) {
        self.sub_chunks.remove(pos.x, pos.y, pos.z);
    }

    fn request_light_update(&mut self, kind: LightType, pos: BlockPos) {
        self.queue.push(LightUpdate::Check { kind, pos });
    }

    fn request_relight(&mut self, pos: BlockPos) {
        self.queue.push(LightUpdate::Relight(pos));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_area_loaded_needs_every_column() {
        let mut context = LightContext::new(true, 0.75, 16).unwrap();
        let center = BlockPos::new(8, 64, 8);
        assert!(!context.is_area_loaded(center, 16));

        for x in -1..=1 {
            for z in -1..=1 {
                context.mark_column_loaded(ColumnPos::new(x, z));
            }
        }
        assert!(context.is_area_loaded(center, 16));
        assert!(!context.is_area_loaded(center, 32));

        context.mark_column_unloaded(ColumnPos::new(1, 1));
        assert!(!context.is_area_loaded(center, 16));
        // radius 0 only needs the centre column
        assert!(context.is_area_loaded(center, 0));
    }

    #[test]
    fn test_sub_chunk_registration() {
        let mut context = LightContext::new(false, 0.75, 16).unwrap();
        let pos = SubChunkPos::new(-4, 2, 9);
        context.on_sub_chunk_created(pos);
        assert!(context.is_sub_chunk_resident(pos));
        assert_eq!(context.resident_sub_chunks().len(), 1);

        context.on_sub_chunk_removed(pos);
        assert!(!context.is_sub_chunk_resident(pos));
    }

    #[test]
    fn test_requests_are_queued() {
        let mut context = LightContext::new(true, 0.75, 16).unwrap();
        context.request_light_update(LightType::Sky, BlockPos::new(1, 2, 3));
        context.request_light_update(LightType::Sky, BlockPos::new(1, 2, 3));
        context.request_relight(BlockPos::new(1, 2, 3));

        let updates = context.drain_updates();
        assert_eq!(
            updates,
            vec![
                LightUpdate::Check {
                    kind: LightType::Sky,
                    pos: BlockPos::new(1, 2, 3)
                },
                LightUpdate::Relight(BlockPos::new(1, 2, 3)),
            ]
        );
        assert!(context.queue().is_empty());
    }

    #[test]
    fn test_rejects_bad_load_factor() {
        assert!(LightContext::new(true, 1.5, 16).is_err());
    }
}
