//! Column storage abstraction.
//!
//! This module provides the `ChunkStorage` enum which abstracts column persistence.
//! Variants can store columns on disk (one compressed file per column) or in memory
//! (via `RamOnlyStorage`) for tests and throwaway worlds.

use std::sync::Arc;

use cubic_utils::ColumnPos;

use crate::block::BlockRegistry;
use crate::chunk::{column::Column, sub_chunk::SubChunkFactory};
use crate::config::{StorageConfig, StorageKind};
use crate::error::StorageError;

use super::disk::DiskStorage;
use super::ram_only::RamOnlyStorage;

/// Column storage backend.
#[derive(Debug)]
pub enum ChunkStorage {
    /// One zstd compressed snapshot file per column.
    Disk(DiskStorage),
    /// In-memory storage for tests and throwaway worlds.
    RamOnly(RamOnlyStorage),
}

impl ChunkStorage {
    /// Opens the backend named by the configuration.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Ok(match config.kind {
            StorageKind::Disk => Self::Disk(DiskStorage::open(&config.path)?),
            StorageKind::Ram => Self::RamOnly(RamOnlyStorage::new()),
        })
    }

    /// Loads a column from storage.
    ///
    /// Returns `Ok(None)` if the column doesn't exist in storage.
    pub fn load_column(
        &self,
        pos: ColumnPos,
        has_sky: bool,
        registry: &impl BlockRegistry,
        factory: &Arc<dyn SubChunkFactory>,
    ) -> Result<Option<Column>, StorageError> {
        let bytes = match self {
            Self::Disk(disk) => disk.read_column(pos)?,
            Self::RamOnly(ram) => ram.read_column(pos),
        };
        let Some(bytes) = bytes else {
            return Ok(None);
        };

        let column = Column::with_factory(pos, has_sky, Arc::clone(factory))
            .decode(&bytes, true, registry)?;
        Ok(Some(column))
    }

    /// Saves a column, replacing any stored version.
    pub fn save_column(&self, column: &Column) -> Result<(), StorageError> {
        let bytes = column.encode(true)?;
        match self {
            Self::Disk(disk) => disk.write_column(column.pos(), &bytes)?,
            Self::RamOnly(ram) => ram.write_column(column.pos(), bytes),
        }
        Ok(())
    }

    /// Checks if a column exists in storage.
    pub fn column_exists(&self, pos: ColumnPos) -> Result<bool, StorageError> {
        Ok(match self {
            Self::Disk(disk) => disk.column_exists(pos),
            Self::RamOnly(ram) => ram.column_exists(pos),
        })
    }
}
