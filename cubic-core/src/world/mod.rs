//! The world: loaded columns, their storage and the tick driver.

pub mod light_context;
pub mod light_queue;

use std::collections::hash_map::Entry;
use std::mem;
use std::sync::Arc;

use cubic_utils::{BlockPos, ColumnPos, SubChunkPos};
use rustc_hash::FxHashMap;

use crate::block::{BlockId, BlockRegistry, BlockTable};
use crate::chunk::{
    column::{Column, ColumnBlock},
    light_type::LightType,
    sub_chunk::{EmptySubChunkFactory, SubChunk, SubChunkFactory},
};
use crate::chunk_saver::ChunkStorage;
use crate::config::WorldConfig;
use crate::error::{StorageError, WorldError};

pub use light_context::LightContext;
pub use light_queue::{LightUpdate, LightUpdateQueue};

/// What the column lighting code needs from the surrounding world.
pub trait WorldContext {
    /// Whether the world has a sky.
    fn has_sky(&self) -> bool;

    /// Whether every column within `radius` blocks of `center` is loaded.
    fn is_area_loaded(&self, center: BlockPos, radius: i32) -> bool;

    /// Called after a column lazily creates a sub-chunk.
    fn on_sub_chunk_created(&mut self, pos: SubChunkPos);

    /// Called after a sub-chunk leaves memory.
    fn on_sub_chunk_removed(&mut self, pos: SubChunkPos);

    /// Asks the light engine to recheck one channel at a position.
    fn request_light_update(&mut self, kind: LightType, pos: BlockPos);

    /// Asks the light engine to recheck every channel at a position.
    fn request_relight(&mut self, pos: BlockPos);
}

/// Read access to blocks across column borders.
pub trait BlockAccess {
    /// The light emitted by the block at `pos`, 0 when unknown.
    fn light_emission_at(&self, pos: BlockPos) -> u8;
}

/// A set of loaded columns driven one tick at a time.
#[derive(Debug)]
pub struct World {
    columns: FxHashMap<ColumnPos, Column>,
    registry: BlockTable,
    storage: ChunkStorage,
    lighting: LightContext,
    factory: Arc<dyn SubChunkFactory>,
    tick_count: u64,
}

impl World {
    /// Creates a world from its configuration.
    pub fn new(config: &WorldConfig, registry: BlockTable) -> Result<Self, WorldError> {
        let storage = ChunkStorage::from_config(&config.storage)?;
        Self::with_storage(config, registry, storage)
    }

    /// Creates a world backed by the given storage.
    pub fn with_storage(
        config: &WorldConfig,
        registry: BlockTable,
        storage: ChunkStorage,
    ) -> Result<Self, WorldError> {
        let lighting = LightContext::new(
            config.has_sky,
            config.column_map_load_factor,
            config.column_map_capacity,
        )?;
        Ok(Self {
            columns: FxHashMap::default(),
            registry,
            storage,
            lighting,
            factory: Arc::new(EmptySubChunkFactory),
            tick_count: 0,
        })
    }

    /// Replaces the factory used for new columns.
    #[must_use]
    pub fn with_factory(mut self, factory: Arc<dyn SubChunkFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Whether the world has a sky.
    #[must_use]
    pub fn has_sky(&self) -> bool {
        self.lighting.has_sky()
    }

    /// The block registry.
    #[must_use]
    pub fn registry(&self) -> &BlockTable {
        &self.registry
    }

    /// The factory new sub-chunks come from.
    #[must_use]
    pub fn factory(&self) -> &Arc<dyn SubChunkFactory> {
        &self.factory
    }

    /// Whether storage holds a saved copy of the column.
    pub fn is_column_stored(&self, pos: ColumnPos) -> Result<bool, StorageError> {
        self.storage.column_exists(pos)
    }

    /// World-wide lighting state.
    #[must_use]
    pub fn lighting(&self) -> &LightContext {
        &self.lighting
    }

    /// Number of ticks run so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Number of loaded columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// A loaded column.
    #[must_use]
    pub fn column(&self, pos: ColumnPos) -> Option<&Column> {
        self.columns.get(&pos)
    }


    /// Loads a column from storage, or creates an empty one if storage has none.
    ///
    /// Already loaded columns are returned as they are.
    pub fn load_column(&mut self, pos: ColumnPos) -> Result<&mut Column, StorageError> {
        let has_sky = self.lighting.has_sky();
        let column = match self.columns.entry(pos) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let column = self
                    .storage
                    .load_column(pos, has_sky, &self.registry, &self.factory)?
                    .unwrap_or_else(|| Column::with_factory(pos, has_sky, Arc::clone(&self.factory)));
                register_column(&mut self.lighting, &column);
                entry.insert(column)
            }
        };
        Ok(column)
    }

    /// Adds a column built elsewhere, replacing any loaded one at the same position.
    pub fn insert_column(&mut self, column: Column) {
        let pos = column.pos();
        if let Some(previous) = self.columns.remove(&pos) {
            deregister_column(&mut self.lighting, &previous);
        }
        register_column(&mut self.lighting, &column);
        self.columns.insert(pos, column);
    }

    /// Unloads a column, saving it first when it has unsaved changes.
    ///
    /// Returns false if the column was not loaded. The column is dropped from memory
    /// even when the save fails.
    pub fn unload_column(&mut self, pos: ColumnPos) -> Result<bool, StorageError> {
        let Some(mut column) = self.columns.remove(&pos) else {
            return Ok(false);
        };
        deregister_column(&mut self.lighting, &column);

        if column.needs_saving(self.tick_count) {
            self.storage.save_column(&column)?;
            column.mark_saved(self.tick_count);
        }
        Ok(true)
    }

    /// Saves every column with unsaved changes, returning how many were written.
    pub fn save_all(&mut self) -> Result<usize, StorageError> {
        let mut saved = 0;
        for column in self.columns.values_mut() {
            if !column.needs_saving(self.tick_count) {
                continue;
            }
            if let Err(err) = self.storage.save_column(column) {
                log::error!("Failed to save column {}: {err}", column.pos());
                return Err(err);
            }
            column.mark_saved(self.tick_count);
            saved += 1;
        }
        Ok(saved)
    }

    /// Writes a block, returning true if anything changed.
    ///
    /// Writes into columns that are not loaded are ignored.
    pub fn set_block(&mut self, pos: BlockPos, id: BlockId, metadata: u8) -> bool {
        let Some(column) = self.columns.get_mut(&pos.column()) else {
            log::debug!("Ignoring block write at {pos}, column not loaded");
            return false;
        };
        column.set_block(pos, id, metadata, &self.registry, &mut self.lighting)
    }

    /// The block at a position, air when unknown.
    #[must_use]
    pub fn block(&self, pos: BlockPos) -> BlockId {
        match self.column_block(pos) {
            Some(ColumnBlock::Block(id)) => id,
            _ => BlockId::AIR,
        }
    }

    /// A light value at a position, 0 when the column is not loaded.
    #[must_use]
    pub fn light(&self, kind: LightType, pos: BlockPos) -> u8 {
        let (local_x, y, local_z) = pos.column_local();
        self.columns
            .get(&pos.column())
            .map_or(0, |column| column.light(kind, local_x, y, local_z))
    }

    /// Gets or creates a sub-chunk of a loaded column, `None` if the column is not loaded.
    pub fn get_or_create_sub_chunk(&mut self, pos: SubChunkPos) -> Option<&mut SubChunk> {
        let column = self.columns.get_mut(&pos.column())?;
        Some(column.get_or_create_sub_chunk(pos.y, &mut self.lighting))
    }

    /// Adds a loaded sub-chunk to its column, returning the one it replaced.
    ///
    /// The sub-chunk is handed back as `Err` when its column is not loaded.
    pub fn add_sub_chunk(&mut self, sub_chunk: SubChunk) -> Result<Option<SubChunk>, SubChunk> {
        match self.columns.get_mut(&sub_chunk.pos().column()) {
            Some(column) => column.add_sub_chunk(sub_chunk, &mut self.lighting),
            None => Err(sub_chunk),
        }
    }

    /// Removes a sub-chunk from a loaded column.
    pub fn remove_sub_chunk(&mut self, pos: SubChunkPos) -> bool {
        self.columns
            .get_mut(&pos.column())
            .and_then(|column| column.remove_sub_chunk(pos.y, &mut self.lighting))
            .is_some()
    }

    /// Runs one tick: a relight pass over every loaded column.
    pub fn tick(&mut self) {
        let _span = tracing::debug_span!("world_tick", tick = self.tick_count).entered();

        let positions: Vec<ColumnPos> = self.columns.keys().copied().collect();
        let mut requests = Vec::new();
        for pos in positions {
            let Some(column) = self.columns.get_mut(&pos) else {
                continue;
            };
            let mut scheduler = mem::take(column.relight_scheduler_mut());

            if let Some(column) = self.columns.get(&pos) {
                scheduler.run_pass(pos, column.sub_chunks(), &*self, &mut requests);
            }

            if let Some(column) = self.columns.get_mut(&pos) {
                *column.relight_scheduler_mut() = scheduler;
            }
        }

        if !requests.is_empty() {
            tracing::trace!(count = requests.len(), "relight requests");
        }
        for pos in requests {
            self.lighting.request_relight(pos);
        }
        self.tick_count += 1;
    }

    /// Takes every pending light update for the external light engine.
    pub fn drain_light_updates(&mut self) -> Vec<LightUpdate> {
        self.lighting.drain_updates()
    }

    fn column_block(&self, pos: BlockPos) -> Option<ColumnBlock> {
        let (local_x, y, local_z) = pos.column_local();
        self.columns
            .get(&pos.column())
            .map(|column| column.block(local_x, y, local_z))
    }
}

fn register_column(lighting: &mut LightContext, column: &Column) {
    lighting.mark_column_loaded(column.pos());
    for pos in column.sub_chunk_positions() {
        lighting.on_sub_chunk_created(pos);
    }
}

fn deregister_column(lighting: &mut LightContext, column: &Column) {
    lighting.mark_column_unloaded(column.pos());
    for pos in column.sub_chunk_positions() {
        lighting.on_sub_chunk_removed(pos);
    }
}

impl BlockAccess for World {
    fn light_emission_at(&self, pos: BlockPos) -> u8 {
        match self.column_block(pos) {
            Some(ColumnBlock::Block(id)) => self.registry.light_emission(id),
            _ => 0,
        }
    }
}
