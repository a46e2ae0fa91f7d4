//! # Cubic
//!
//! Headless host for the cubic column engine: loads a square of columns around the
//! origin, drives world ticks and saves on shutdown.
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    missing_docs,
    clippy::unwrap_used
)]
#![allow(
    clippy::single_call_fn,
    clippy::multiple_inherent_impl,
    clippy::shadow_unrelated,
    clippy::missing_errors_doc,
    clippy::struct_excessive_bools,
    clippy::needless_pass_by_value,
    clippy::cargo_common_metadata
)]

use std::sync::Arc;

use cubic_core::{
    block::{BlockId, BlockTable},
    chunk::column::Column,
    config::WorldConfig,
    world::World,
};
use cubic_utils::{BlockPos, ColumnPos};

/// Logging setup.
pub mod logger;

/// Height of the generated flat terrain.
pub const GROUND_HEIGHT: usize = 64;

/// Ticks between scripted block edits.
const EDIT_INTERVAL: u64 = 20;

/// Layers of generated terrain, bottom to top.
const FLAT_LAYERS: [(&str, usize); 4] = [("bedrock", 1), ("stone", 59), ("dirt", 3), ("grass", 1)];

/// Drives a world without any clients attached.
pub struct HeadlessDriver {
    /// The world being simulated.
    pub world: World,
    config: WorldConfig,
    light_updates: usize,
}

impl HeadlessDriver {
    /// Creates the world described by `config`.
    pub fn new(config: WorldConfig) -> anyhow::Result<Self> {
        log::info!("Starting cubic world");
        let world = World::new(&config, BlockTable::with_common_blocks())?;
        Ok(Self {
            world,
            config,
            light_updates: 0,
        })
    }

    /// Creates a driver around an existing world.
    #[must_use]
    pub fn with_world(config: WorldConfig, world: World) -> Self {
        Self {
            world,
            config,
            light_updates: 0,
        }
    }

    /// Loads every column within the view radius, generating flat terrain for
    /// columns storage does not have. Returns how many columns were generated.
    pub fn load_view(&mut self) -> anyhow::Result<usize> {
        let radius = i32::from(self.config.view_radius);
        let mut generated = 0;

        for x in -radius..=radius {
            for z in -radius..=radius {
                let pos = ColumnPos::new(x, z);
                if self.world.is_column_stored(pos)? {
                    self.world.load_column(pos)?;
                } else {
                    let column = self.flat_column(pos);
                    self.world.insert_column(column);
                    generated += 1;
                }
            }
        }

        log::info!(
            "Loaded {} columns ({generated} generated)",
            self.world.column_count()
        );
        Ok(generated)
    }

    /// Builds a flat column and lights it.
    #[must_use]
    pub fn flat_column(&self, pos: ColumnPos) -> Column {
        let registry = self.world.registry();
        let mut blocks = vec![BlockId::AIR; 256 * GROUND_HEIGHT];

        let mut y = 0;
        for (key, depth) in FLAT_LAYERS {
            let id = registry.by_key(key).unwrap_or(BlockId::AIR);
            for layer in y..y + depth {
                for x in 0..16 {
                    for z in 0..16 {
                        blocks[x * GROUND_HEIGHT * 16 + z * GROUND_HEIGHT + layer] = id;
                    }
                }
            }
            y += depth;
        }

        let mut column = Column::from_legacy_blocks(
            pos,
            self.world.has_sky(),
            &blocks,
            &[],
            registry,
            Arc::clone(self.world.factory()),
        );
        column.generate_skylight_map();
        column
    }

    /// Runs the configured number of ticks.
    pub fn run(&mut self) {
        for _ in 0..self.config.simulation_ticks {
            self.step();
        }
        log::info!(
            "Ran {} ticks, {} light updates handed out",
            self.world.tick_count(),
            self.light_updates
        );
    }

    /// Runs a single tick, placing a scripted block every few ticks.
    pub fn step(&mut self) {
        let tick = self.world.tick_count();
        if tick % EDIT_INTERVAL == 0 {
            let step = (tick / EDIT_INTERVAL) as i32;
            let pos = BlockPos::new(step % 16, GROUND_HEIGHT as i32 + step / 16, 8);
            let glowstone = self.world.registry().by_key("glowstone").unwrap_or(BlockId::AIR);
            self.world.set_block(pos, glowstone, 0);
        }

        self.world.tick();
        self.light_updates += self.world.drain_light_updates().len();
    }

    /// Light updates drained so far.
    #[must_use]
    pub fn light_updates(&self) -> usize {
        self.light_updates
    }

    /// Saves every modified column.
    pub fn shutdown(&mut self) -> anyhow::Result<usize> {
        let saved = self.world.save_all()?;
        log::info!("Saved {saved} columns, stopping");
        Ok(saved)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cubic_core::{
        chunk::light_type::LightType,
        config::{StorageConfig, StorageKind},
    };

    use super::*;

    fn config(kind: StorageKind, path: String) -> WorldConfig {
        WorldConfig {
            storage: StorageConfig { kind, path },
            simulation_ticks: 41,
            view_radius: 1,
            ..WorldConfig::default()
        }
    }

    #[test]
    fn test_flat_terrain_is_lit() {
        let driver = HeadlessDriver::new(config(StorageKind::Ram, String::new())).unwrap();
        let column = driver.flat_column(ColumnPos::new(0, 0));

        assert_eq!(column.height_value(3, 3), Some(GROUND_HEIGHT as i32));
        assert_eq!(column.light(LightType::Sky, 3, 63, 3), 0);
        assert_eq!(column.light(LightType::Sky, 3, 64, 3), 15);
        assert_eq!(column.sub_chunks().len(), 4);
    }

    #[test]
    fn test_run_and_shutdown() {
        let mut driver = HeadlessDriver::new(config(StorageKind::Ram, String::new())).unwrap();
        assert_eq!(driver.load_view().unwrap(), 9);

        driver.run();
        assert_eq!(driver.world.tick_count(), 41);
        assert!(driver.light_updates() > 0);

        let glowstone = driver.world.registry().by_key("glowstone").unwrap();
        assert_eq!(driver.world.block(BlockPos::new(2, 64, 8)), glowstone);
        assert_eq!(driver.shutdown().unwrap(), 9);
    }

    #[test]
    fn test_saved_columns_are_loaded_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_string_lossy().into_owned();

        let mut driver = HeadlessDriver::new(config(StorageKind::Disk, path.clone())).unwrap();
        driver.load_view().unwrap();
        driver.step();
        driver.shutdown().unwrap();

        let mut driver = HeadlessDriver::new(config(StorageKind::Disk, path)).unwrap();
        assert_eq!(driver.load_view().unwrap(), 0);
        let glowstone = driver.world.registry().by_key("glowstone").unwrap();
        assert_eq!(driver.world.block(BlockPos::new(0, 64, 8)), glowstone);
    }
}
