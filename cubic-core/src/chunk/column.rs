//! A column: the 16x16 footprint of unbounded height made of sparse sub-chunks.

use std::sync::Arc;

use cubic_utils::{
    ColumnPos, SubChunkPos,
    coords::{self, block_to_local, block_to_sub_chunk},
};

use crate::block::{BlockId, BlockRegistry};
use crate::chunk::{
    entity_container::{EntityContainer, EntityId},
    light_type::LightType,
    opacity_index::OpacityIndex,
    relight::RelightScheduler,
    sub_chunk::{EmptySubChunkFactory, SubChunk, SubChunkFactory},
    sub_chunk_index::{LegacySegment, SubChunkIndex},
};
use crate::world::WorldContext;

/// Extra blocks added above and below an entity query.
const ENTITY_QUERY_MARGIN: f64 = 2.0;

/// Bytes of per-column biome data.
pub const BIOME_ARRAY_SIZE: usize = 256;

/// What a column reports at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnBlock {
    /// A block from a resident sub-chunk.
    Block(BlockId),
    /// The sub-chunk is not resident but the opacity index remembers something there.
    Placeholder {
        /// The remembered opacity.
        opacity: u8,
    },
    /// Nothing known at this position.
    Air,
}

/// Read access shared by a column and its dense legacy projection.
pub trait BlockView {
    /// The block id at a column local position, air when unknown.
    fn block_id(&self, local_x: usize, y: i32, local_z: usize) -> BlockId;

    /// The metadata at a column local position, 0 when unknown.
    fn metadata(&self, local_x: usize, y: i32, local_z: usize) -> u8;
}

/// Cached lowest height receiving precipitation for one block column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrecipitationHeight {
    /// Needs recomputing.
    Stale,
    /// Precipitation reaches down to this height.
    Known(i32),
    /// Nothing in the column stops precipitation.
    Unsheltered,
}

/// A column of sub-chunks with its opacity record, entities and derived caches.
#[derive(Debug)]
pub struct Column {
    pub(crate) pos: ColumnPos,
    pub(crate) has_sky: bool,
    pub(crate) sub_chunks: SubChunkIndex,
    pub(crate) opacity: OpacityIndex,
    pub(crate) entities: EntityContainer,
    pub(crate) precipitation: Box<[PrecipitationHeight]>,
    pub(crate) biomes: Box<[u8; BIOME_ARRAY_SIZE]>,
    pub(crate) relight: RelightScheduler,
    pub(crate) modified: bool,
    pub(crate) light_populated: bool,
    pub(crate) terrain_populated: bool,
}

impl Column {
    /// Creates an empty column allocating all-air sub-chunks.
    #[must_use]
    pub fn new(pos: ColumnPos, has_sky: bool) -> Self {
        Self::with_factory(pos, has_sky, Arc::new(EmptySubChunkFactory))
    }

    /// Creates an empty column allocating sub-chunks through `factory`.
    #[must_use]
    pub fn with_factory(pos: ColumnPos, has_sky: bool, factory: Arc<dyn SubChunkFactory>) -> Self {
        Self {
            pos,
            has_sky,
            sub_chunks: SubChunkIndex::with_factory(pos, has_sky, factory),
            opacity: OpacityIndex::new(),
            entities: EntityContainer::new(),
            precipitation: vec![PrecipitationHeight::Stale; 256].into_boxed_slice(),
            biomes: Box::new([0; BIOME_ARRAY_SIZE]),
            relight: RelightScheduler::new(),
            modified: false,
            light_populated: false,
            terrain_populated: false,
        }
    }

    /// Builds a column from a dense generator array.
    ///
    /// `blocks` holds `maxY = blocks.len() / 256` layers starting at height 0, indexed
    /// `x * maxY * 16 + z * maxY + y`; `metadata` uses the same layout. Blocks are written
    /// without lighting updates and the opacity index is filled as they go in.
    #[must_use]
    pub fn from_legacy_blocks(
        pos: ColumnPos,
        has_sky: bool,
        blocks: &[BlockId],
        metadata: &[u8],
        registry: &impl BlockRegistry,
        factory: Arc<dyn SubChunkFactory>,
    ) -> Self {
        let mut column = Self::with_factory(pos, has_sky, factory);
        let max_y = blocks.len() / 256;

        for local_x in 0..16 {
            for local_z in 0..16 {
                for block_y in 0..max_y {
                    let index = local_x * max_y * 16 + local_z * max_y + block_y;
                    let id = blocks[index];
                    if id.is_air() {
                        continue;
                    }

                    let y = block_y as i32;
                    let meta = metadata.get(index).copied().unwrap_or(0);
                    column
                        .sub_chunks
                        .get_or_create(block_to_sub_chunk(y))
                        .set_block(local_x, block_to_local(y), local_z, id, meta);
                    column
                        .opacity
                        .set_opacity(local_x, y, local_z, registry.light_opacity(id));
                }
            }
        }

        column.modified = true;
        column
    }

    /// The position of this column.
    #[must_use]
    pub fn pos(&self) -> ColumnPos {
        self.pos
    }

    /// Whether the world has a sky.
    #[must_use]
    pub fn has_sky(&self) -> bool {
        self.has_sky
    }

    /// The resident sub-chunks.
    #[must_use]
    pub fn sub_chunks(&self) -> &SubChunkIndex {
        &self.sub_chunks
    }

    /// The sub-chunk at vertical index `y`.
    #[must_use]
    pub fn sub_chunk(&self, y: i32) -> Option<&SubChunk> {
        self.sub_chunks.get(y)
    }

    /// Gets the sub-chunk at `y`, creating an empty one if absent.
    ///
    /// A created sub-chunk is announced to `ctx`.
    pub fn get_or_create_sub_chunk(
        &mut self,
        y: i32,
        ctx: &mut impl WorldContext,
    ) -> &mut SubChunk {
        if !self.sub_chunks.contains(y) {
            self.relight.invalidate();
            ctx.on_sub_chunk_created(self.sub_chunk_pos(y));
        }
        self.sub_chunks.get_or_create(y)
    }

    /// Adds a loaded sub-chunk, returning the one it replaced.
    ///
    /// Sub-chunks belonging to another column are rejected and handed back as `Err`.
    pub fn add_sub_chunk(
        &mut self,
        sub_chunk: SubChunk,
        ctx: &mut impl WorldContext,
    ) -> Result<Option<SubChunk>, SubChunk> {
        let pos = sub_chunk.pos();
        if pos.column() != self.pos {
            return Err(sub_chunk);
        }

        self.relight.invalidate();
        let replaced = self.sub_chunks.insert(sub_chunk);
        if replaced.is_none() {
            ctx.on_sub_chunk_created(pos);
        }
        Ok(replaced)
    }

    /// Removes the sub-chunk at `y`, announcing the removal to `ctx`.
    pub fn remove_sub_chunk(&mut self, y: i32, ctx: &mut impl WorldContext) -> Option<SubChunk> {
        let removed = self.sub_chunks.remove(y)?;
        self.relight.invalidate();
        ctx.on_sub_chunk_removed(removed.pos());
        Some(removed)
    }

    fn sub_chunk_pos(&self, y: i32) -> SubChunkPos {
        SubChunkPos::new(self.pos.x, y, self.pos.z)
    }

    /// Positions of all resident sub-chunks.
    pub fn sub_chunk_positions(&self) -> impl Iterator<Item = SubChunkPos> + '_ {
        self.sub_chunks.iter().map(SubChunk::pos)
    }

    /// Dense projection of the resident sub-chunks' storage, from index 0 upwards.
    pub fn legacy_view(&mut self) -> LegacyView<'_> {
        LegacyView {
            segments: self.sub_chunks.legacy_view(),
        }
    }

    /// The opacity record.
    #[must_use]
    pub fn opacity_index(&self) -> &OpacityIndex {
        &self.opacity
    }

    /// The relight cursor.
    #[must_use]
    pub fn relight_scheduler(&self) -> &RelightScheduler {
        &self.relight
    }

    /// Mutable access to the relight cursor, used by the tick driver to take it out.
    pub fn relight_scheduler_mut(&mut self) -> &mut RelightScheduler {
        &mut self.relight
    }

    /// Per-column biome bytes.
    #[must_use]
    pub fn biomes(&self) -> &[u8; BIOME_ARRAY_SIZE] {
        &self.biomes
    }

    /// Mutable biome bytes.
    pub fn biomes_mut(&mut self) -> &mut [u8; BIOME_ARRAY_SIZE] {
        self.modified = true;
        &mut self.biomes
    }

    /// What is known at a column local position.
    #[must_use]
    pub fn block(&self, local_x: usize, y: i32, local_z: usize) -> ColumnBlock {
        if let Some(sub_chunk) = self.sub_chunks.get(block_to_sub_chunk(y)) {
            return ColumnBlock::Block(sub_chunk.block(local_x, block_to_local(y), local_z));
        }

        match self.opacity.opacity(local_x, y, local_z) {
            0 => ColumnBlock::Air,
            opacity => ColumnBlock::Placeholder { opacity },
        }
    }

    /// Sets the metadata in a resident sub-chunk, returning true if it changed.
    pub fn set_metadata(&mut self, local_x: usize, y: i32, local_z: usize, value: u8) -> bool {
        let changed = self
            .sub_chunks
            .get(block_to_sub_chunk(y))
            .is_some_and(|sub_chunk| {
                sub_chunk.set_metadata(local_x, block_to_local(y), local_z, value)
            });
        if changed {
            self.modified = true;
        }
        changed
    }

    /// The recorded opacity at a position.
    #[must_use]
    pub fn opacity(&self, local_x: usize, y: i32, local_z: usize) -> u8 {
        self.opacity.opacity(local_x, y, local_z)
    }

    /// The lowest height that sees the sky, one above the top non-transparent block.
    #[must_use]
    pub fn height_value(&self, local_x: usize, local_z: usize) -> Option<i32> {
        self.opacity
            .top_non_transparent(local_x, local_z)
            .map(|top| top.saturating_add(1))
    }

    /// Whether nothing opaque is recorded at or above `y`.
    #[must_use]
    pub fn can_see_sky(&self, local_x: usize, y: i32, local_z: usize) -> bool {
        self.height_value(local_x, local_z)
            .is_none_or(|height| y >= height)
    }

    /// Vertical index of the sub-chunk holding the topmost non-transparent block.
    #[must_use]
    pub fn top_sub_chunk_y(&self) -> Option<i32> {
        self.opacity
            .top_non_transparent_overall()
            .map(block_to_sub_chunk)
    }

    /// Lowest block height of [`Column::top_sub_chunk_y`].
    #[must_use]
    pub fn top_filled_segment(&self) -> Option<i32> {
        self.top_sub_chunk_y().map(coords::sub_chunk_to_min_block)
    }

    /// True if no resident sub-chunk between the two heights holds a block.
    #[must_use]
    pub fn are_levels_empty(&self, min_block_y: i32, max_block_y: i32) -> bool {
        self.sub_chunks
            .range(block_to_sub_chunk(min_block_y), block_to_sub_chunk(max_block_y))
            .all(|sub_chunk| !sub_chunk.has_blocks())
    }

    /// Lowest block height of the lowest resident sub-chunk.
    #[must_use]
    pub fn min_resident_block_y(&self) -> Option<i32> {
        self.sub_chunks.first_y().map(coords::sub_chunk_to_min_block)
    }

    /// Highest block height of the highest resident sub-chunk.
    #[must_use]
    pub fn max_resident_block_y(&self) -> Option<i32> {
        self.sub_chunks.last_y().map(coords::sub_chunk_to_max_block)
    }

    /// Reads a light value.
    ///
    /// Positions in non-resident sub-chunks report the channel default if they see
    /// the sky, 0 otherwise.
    #[must_use]
    pub fn light(&self, kind: LightType, local_x: usize, y: i32, local_z: usize) -> u8 {
        if let Some(sub_chunk) = self.sub_chunks.get(block_to_sub_chunk(y)) {
            return sub_chunk.light(kind, local_x, block_to_local(y), local_z);
        }

        if kind == LightType::Sky && !self.has_sky {
            return 0;
        }
        if self.can_see_sky(local_x, y, local_z) {
            kind.default_value()
        } else {
            0
        }
    }

    /// Writes a light value into a resident sub-chunk; dropped otherwise.
    pub fn set_light(&mut self, kind: LightType, local_x: usize, y: i32, local_z: usize, value: u8) {
        if let Some(sub_chunk) = self.sub_chunks.get(block_to_sub_chunk(y)) {
            sub_chunk.set_light(kind, local_x, block_to_local(y), local_z, value);
            self.modified = true;
        }
    }

    /// Brightness after subtracting the sky darkening, as seen by renderers.
    #[must_use]
    pub fn combined_light(
        &self,
        local_x: usize,
        y: i32,
        local_z: usize,
        skylight_subtracted: u8,
    ) -> u8 {
        if let Some(sub_chunk) = self.sub_chunks.get(block_to_sub_chunk(y)) {
            let local_y = block_to_local(y);
            let sky = sub_chunk
                .light(LightType::Sky, local_x, local_y, local_z)
                .saturating_sub(skylight_subtracted);
            let block = sub_chunk.light(LightType::Block, local_x, local_y, local_z);
            return sky.max(block);
        }

        let sky_default = LightType::Sky.default_value();
        if self.has_sky && skylight_subtracted < sky_default {
            sky_default - skylight_subtracted
        } else {
            0
        }
    }

    /// The lowest height rain and snow reach, `None` if nothing stops them.
    pub fn precipitation_height(
        &mut self,
        local_x: usize,
        local_z: usize,
        registry: &impl BlockRegistry,
    ) -> Option<i32> {
        let slot = local_z << 4 | local_x;
        let height = match self.precipitation[slot] {
            PrecipitationHeight::Stale => {
                let computed = self.compute_precipitation_height(local_x, local_z, registry);
                self.precipitation[slot] = computed;
                computed
            }
            cached => cached,
        };

        match height {
            PrecipitationHeight::Known(y) => Some(y),
            PrecipitationHeight::Stale | PrecipitationHeight::Unsheltered => None,
        }
    }

    fn compute_precipitation_height(
        &self,
        local_x: usize,
        local_z: usize,
        registry: &impl BlockRegistry,
    ) -> PrecipitationHeight {
        let (Some(min_y), Some(resident_top)) =
            (self.min_resident_block_y(), self.max_resident_block_y())
        else {
            return PrecipitationHeight::Unsheltered;
        };
        let max_y = self
            .top_filled_segment()
            .map_or(resident_top, |segment| (segment + 15).max(resident_top));

        for y in (min_y..=max_y).rev() {
            let blocks = match self.block(local_x, y, local_z) {
                ColumnBlock::Block(id) => registry.blocks_precipitation(id),
                ColumnBlock::Placeholder { .. } => true,
                ColumnBlock::Air => false,
            };
            if blocks {
                return PrecipitationHeight::Known(y + 1);
            }
        }
        PrecipitationHeight::Unsheltered
    }

    /// Drops the cached precipitation height if a write at `y` may change it.
    pub(crate) fn invalidate_precipitation_at(&mut self, local_x: usize, y: i32, local_z: usize) {
        let slot = &mut self.precipitation[local_z << 4 | local_x];
        let stale = match *slot {
            PrecipitationHeight::Known(height) => y >= height - 1,
            PrecipitationHeight::Unsheltered => true,
            PrecipitationHeight::Stale => false,
        };
        if stale {
            *slot = PrecipitationHeight::Stale;
        }
    }

    pub(crate) fn clear_precipitation(&mut self) {
        self.precipitation.fill(PrecipitationHeight::Stale);
    }

    /// Tracks an entity at height `y`, inside its sub-chunk when that one is resident.
    pub fn add_entity(&mut self, id: EntityId, y: f64) {
        match self.sub_chunks.get_mut(coords::sub_chunk_for_height(y)) {
            Some(sub_chunk) => sub_chunk.entities_mut().add(id, y),
            None => self.entities.add(id, y),
        }
    }

    /// Stops tracking an entity last seen in sub-chunk `sub_chunk_y`.
    ///
    /// Returns true if the entity was found in that sub-chunk or in the column itself.
    pub fn remove_entity(&mut self, id: EntityId, sub_chunk_y: i32) -> bool {
        let from_column = self.entities.remove(id);
        if from_column {
            self.modified = true;
        }
        let from_sub_chunk = self
            .sub_chunks
            .get_mut(sub_chunk_y)
            .is_some_and(|sub_chunk| sub_chunk.entities_mut().remove(id));
        from_column || from_sub_chunk
    }

    /// Moves an entity from sub-chunk `from_sub_chunk_y` to wherever height `new_y`
    /// belongs. Returns false if the entity was not tracked.
    pub fn migrate_entity(&mut self, id: EntityId, from_sub_chunk_y: i32, new_y: f64) -> bool {
        if !self.remove_entity(id, from_sub_chunk_y) {
            return false;
        }
        self.add_entity(id, new_y);
        true
    }

    /// Entities whose height lies in `[min_y, max_y]`.
    ///
    /// Sub-chunks up to two blocks beyond the range are searched, then the column's
    /// own container.
    #[must_use]
    pub fn entities_in_range(&self, min_y: f64, max_y: f64) -> Vec<EntityId> {
        let mut out = Vec::new();
        let min_sub_chunk = coords::sub_chunk_for_height(min_y - ENTITY_QUERY_MARGIN);
        let max_sub_chunk = coords::sub_chunk_for_height(max_y + ENTITY_QUERY_MARGIN);
        for sub_chunk in self.sub_chunks.range(min_sub_chunk, max_sub_chunk) {
            sub_chunk.entities().collect_in_range(min_y, max_y, &mut out);
        }
        self.entities.collect_in_range(min_y, max_y, &mut out);
        out
    }

    /// Entities tracked directly by the column.
    #[must_use]
    pub fn entity_container(&self) -> &EntityContainer {
        &self.entities
    }

    /// Whether the column has unsaved changes or entities due for a save.
    #[must_use]
    pub fn needs_saving(&self, now: u64) -> bool {
        self.modified || self.entities.needs_saving(now)
    }

    /// Records a save at tick `now`.
    pub fn mark_saved(&mut self, now: u64) {
        self.entities.mark_saved(now);
        self.modified = false;
    }

    /// Whether anything changed since the last save.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Flags the column as changed.
    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Whether light data was loaded or computed.
    #[must_use]
    pub fn is_light_populated(&self) -> bool {
        self.light_populated
    }

    /// Whether terrain was loaded or generated.
    #[must_use]
    pub fn is_terrain_populated(&self) -> bool {
        self.terrain_populated
    }
}

impl BlockView for Column {
    fn block_id(&self, local_x: usize, y: i32, local_z: usize) -> BlockId {
        match self.block(local_x, y, local_z) {
            ColumnBlock::Block(id) => id,
            ColumnBlock::Placeholder { .. } | ColumnBlock::Air => BlockId::AIR,
        }
    }

    fn metadata(&self, local_x: usize, y: i32, local_z: usize) -> u8 {
        self.sub_chunks
            .get(block_to_sub_chunk(y))
            .map_or(0, |sub_chunk| {
                sub_chunk.metadata(local_x, block_to_local(y), local_z)
            })
    }
}

/// Read-only dense projection of a column for fixed-height consumers.
#[derive(Debug, Clone, Copy)]
pub struct LegacyView<'a> {
    segments: &'a [LegacySegment],
}

impl<'a> LegacyView<'a> {
    /// Number of slots, one past the highest resident index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if no non-negative sub-chunk is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The slots themselves.
    #[must_use]
    pub fn segments(&self) -> &'a [LegacySegment] {
        self.segments
    }

    fn segment_for(&self, y: i32) -> Option<&'a LegacySegment> {
        usize::try_from(block_to_sub_chunk(y))
            .ok()
            .and_then(|index| self.segments.get(index))
    }
}

impl BlockView for LegacyView<'_> {
    fn block_id(&self, local_x: usize, y: i32, local_z: usize) -> BlockId {
        match self.segment_for(y) {
            Some(Some(storage)) => storage.read().block(local_x, block_to_local(y), local_z),
            _ => BlockId::AIR,
        }
    }

    fn metadata(&self, local_x: usize, y: i32, local_z: usize) -> u8 {
        match self.segment_for(y) {
            Some(Some(storage)) => storage.read().metadata(local_x, block_to_local(y), local_z),
            _ => 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::block::BlockTable;
    use crate::world::LightContext;

    fn registry() -> BlockTable {
        BlockTable::with_common_blocks()
    }

    fn id(table: &BlockTable, key: &str) -> BlockId {
        table.by_key(key).unwrap()
    }

    fn ctx() -> LightContext {
        LightContext::new(true, 0.75, 16).unwrap()
    }

    /// A generator array of `max_y` layers with stone below `ground`.
    fn flat_blocks(table: &BlockTable, max_y: usize, ground: usize) -> Vec<BlockId> {
        let stone = id(table, "stone");
        let mut blocks = vec![BlockId::AIR; 256 * max_y];
        for x in 0..16 {
            for z in 0..16 {
                for y in 0..ground {
                    blocks[x * max_y * 16 + z * max_y + y] = stone;
                }
            }
        }
        blocks
    }

    #[test]
    fn test_from_legacy_blocks() {
        let table = registry();
        let blocks = flat_blocks(&table, 64, 20);
        let column = Column::from_legacy_blocks(
            ColumnPos::new(1, 1),
            true,
            &blocks,
            &[],
            &table,
            Arc::new(EmptySubChunkFactory),
        );

        assert_eq!(column.sub_chunks().ys().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(column.block(4, 19, 4), ColumnBlock::Block(id(&table, "stone")));
        assert_eq!(column.block(4, 20, 4), ColumnBlock::Block(BlockId::AIR));
        assert_eq!(column.height_value(4, 4), Some(20));
        assert_eq!(column.top_sub_chunk_y(), Some(1));
        assert_eq!(column.top_filled_segment(), Some(16));
        assert!(column.is_modified());
    }

    #[test]
    fn test_placeholder_for_unloaded_sub_chunk() {
        let table = registry();
        let blocks = flat_blocks(&table, 32, 20);
        let mut column = Column::from_legacy_blocks(
            ColumnPos::new(0, 0),
            true,
            &blocks,
            &[],
            &table,
            Arc::new(EmptySubChunkFactory),
        );
        column.remove_sub_chunk(0, &mut ctx());

        assert_eq!(column.block(0, 5, 0), ColumnBlock::Placeholder { opacity: 255 });
        assert_eq!(column.block(0, -5, 0), ColumnBlock::Air);
        assert_eq!(column.block_id(0, 5, 0), BlockId::AIR);
        assert_eq!(column.light(LightType::Sky, 0, 5, 0), 0);
        assert_eq!(column.light(LightType::Sky, 0, 40, 0), 15);
        assert!(!column.can_see_sky(0, 5, 0));
    }

    #[test]
    fn test_sub_chunk_changes_reach_the_context() {
        let mut ctx = ctx();
        let mut column = Column::new(ColumnPos::new(2, -1), true);

        column.get_or_create_sub_chunk(5, &mut ctx);
        column.get_or_create_sub_chunk(5, &mut ctx);
        assert!(ctx.is_sub_chunk_resident(SubChunkPos::new(2, 5, -1)));
        assert_eq!(ctx.resident_sub_chunks().len(), 1);

        let below = SubChunk::new(SubChunkPos::new(2, -3, -1), true);
        assert!(column.add_sub_chunk(below, &mut ctx).unwrap().is_none());
        assert!(ctx.is_sub_chunk_resident(SubChunkPos::new(2, -3, -1)));

        let foreign = SubChunk::new(SubChunkPos::new(0, 0, 0), true);
        assert!(column.add_sub_chunk(foreign, &mut ctx).is_err());
        assert!(column.sub_chunk(0).is_none());

        assert!(column.remove_sub_chunk(5, &mut ctx).is_some());
        assert!(column.remove_sub_chunk(5, &mut ctx).is_none());
        assert!(!ctx.is_sub_chunk_resident(SubChunkPos::new(2, 5, -1)));
        assert_eq!(ctx.resident_sub_chunks().len(), 1);
    }

    #[test]
    fn test_combined_light_defaults() {
        let column = Column::new(ColumnPos::new(0, 0), true);
        assert_eq!(column.combined_light(0, 100, 0, 4), 11);
        assert_eq!(column.combined_light(0, 100, 0, 15), 0);

        let dark = Column::new(ColumnPos::new(0, 0), false);
        assert_eq!(dark.combined_light(0, 100, 0, 0), 0);
        assert_eq!(dark.light(LightType::Sky, 0, 100, 0), 0);
    }

    #[test]
    fn test_combined_light_resident() {
        let mut column = Column::new(ColumnPos::new(0, 0), true);
        column.get_or_create_sub_chunk(0, &mut ctx());
        column.set_light(LightType::Sky, 1, 1, 1, 12);
        column.set_light(LightType::Block, 1, 1, 1, 9);
        assert_eq!(column.combined_light(1, 1, 1, 5), 9);
        assert_eq!(column.combined_light(1, 1, 1, 2), 10);
        assert!(column.is_modified());
    }

    #[test]
    fn test_are_levels_empty() {
        let mut column = Column::new(ColumnPos::new(0, 0), true);
        column.get_or_create_sub_chunk(2, &mut ctx());
        assert!(column.are_levels_empty(0, 100));
        column
            .sub_chunk(2)
            .unwrap()
            .set_block(0, 0, 0, BlockId(1), 0);
        assert!(!column.are_levels_empty(32, 32));
        assert!(column.are_levels_empty(48, 100));
    }

    #[test]
    fn test_entities_routed_and_queried() {
        let mut column = Column::new(ColumnPos::new(0, 0), true);
        column.get_or_create_sub_chunk(4, &mut ctx());

        column.add_entity(EntityId(1), 70.0);
        column.add_entity(EntityId(2), 10.0);
        assert!(column.sub_chunk(4).unwrap().entities().contains(EntityId(1)));
        assert!(column.entity_container().contains(EntityId(2)));

        let mut found = column.entities_in_range(0.0, 80.0);
        found.sort();
        assert_eq!(found, vec![EntityId(1), EntityId(2)]);
        assert_eq!(column.entities_in_range(60.0, 65.0), Vec::new());

        assert!(column.migrate_entity(EntityId(2), 0, 66.0));
        assert!(column.sub_chunk(4).unwrap().entities().contains(EntityId(2)));
        assert!(!column.entity_container().contains(EntityId(2)));

        assert!(column.remove_entity(EntityId(1), 4));
        assert!(!column.remove_entity(EntityId(1), 4));
        assert!(!column.migrate_entity(EntityId(9), 0, 1.0));
    }

    #[test]
    fn test_needs_saving() {
        let mut column = Column::new(ColumnPos::new(0, 0), true);
        assert!(!column.needs_saving(0));

        column.add_entity(EntityId(1), 3.0);
        column.mark_saved(10);
        assert!(!column.needs_saving(100));
        assert!(column.needs_saving(610));

        column.mark_modified();
        assert!(column.needs_saving(11));
    }

    #[test]
    fn test_precipitation_height() {
        let table = registry();
        let mut column = Column::new(ColumnPos::new(0, 0), true);
        assert_eq!(column.precipitation_height(0, 0, &table), None);

        column
            .get_or_create_sub_chunk(0, &mut ctx())
            .set_block(0, 6, 0, id(&table, "glass"), 0);
        column
            .get_or_create_sub_chunk(0, &mut ctx())
            .set_block(0, 9, 0, id(&table, "torch"), 0);
        column.clear_precipitation();

        assert_eq!(column.precipitation_height(0, 0, &table), Some(7));
        assert_eq!(column.precipitation_height(1, 0, &table), None);

        // writes well below the cached height keep it
        column.invalidate_precipitation_at(0, 2, 0);
        assert_eq!(column.precipitation[0], PrecipitationHeight::Known(7));
        column.invalidate_precipitation_at(0, 6, 0);
        assert_eq!(column.precipitation[0], PrecipitationHeight::Stale);
    }

    #[test]
    fn test_legacy_view_reads_blocks() {
        let mut column = Column::new(ColumnPos::new(0, 0), true);
        column
            .get_or_create_sub_chunk(1, &mut ctx())
            .set_block(2, 3, 4, BlockId(7), 5);
        column.get_or_create_sub_chunk(-1, &mut ctx());

        let view = column.legacy_view();
        assert_eq!(view.len(), 2);
        assert!(view.segments()[0].is_none());
        assert_eq!(view.block_id(2, 19, 4), BlockId(7));
        assert_eq!(view.metadata(2, 19, 4), 5);
        assert_eq!(view.block_id(2, 3, 4), BlockId::AIR);
        assert_eq!(view.block_id(2, -13, 4), BlockId::AIR);
    }
}
