#![allow(clippy::unwrap_used, missing_docs)]

use cubic_core::block::BlockTable;
use cubic_core::chunk::light_type::LightType;
use cubic_core::chunk::relight::CHECKS_PER_PASS;
use cubic_core::chunk_saver::{ChunkStorage, RamOnlyStorage};
use cubic_core::config::WorldConfig;
use cubic_core::world::LightUpdate;
use cubic_core::World;
use cubic_utils::{BlockPos, ColumnPos, SubChunkPos};

fn world() -> World {
    World::with_storage(
        &WorldConfig::default(),
        BlockTable::with_common_blocks(),
        ChunkStorage::RamOnly(RamOnlyStorage::new()),
    )
    .unwrap()
}

fn relight_count(updates: &[LightUpdate]) -> usize {
    updates
        .iter()
        .filter(|update| matches!(update, LightUpdate::Relight(_)))
        .count()
}

#[test]
fn test_cycle_covers_every_block_column() {
    let mut world = world();
    let origin = ColumnPos::new(0, 0);
    world.load_column(origin).unwrap();
    let stone = world.registry().by_key("stone").unwrap();
    world.set_block(BlockPos::new(0, 0, 0), stone, 0);
    world.set_block(BlockPos::new(0, 50, 0), stone, 0);
    world.drain_light_updates();

    let sub_chunks = 2;
    let passes = 256 * sub_chunks / CHECKS_PER_PASS as usize;
    let mut relights = 0;
    for _ in 0..passes {
        world.tick();
        relights += relight_count(&world.drain_light_updates());
    }

    // every air block of both sub-chunks, requested once
    assert_eq!(relights, 2 * 16 * 16 * 16 - 2);
    let scheduler = world.column(origin).unwrap().relight_scheduler();
    assert!(scheduler.is_exhausted());
    assert_eq!(scheduler.snapshot_len(), sub_chunks);

    world.tick();
    assert!(world.drain_light_updates().is_empty());
}

#[test]
fn test_new_sub_chunk_restarts_the_cycle() {
    let mut world = world();
    let origin = ColumnPos::new(0, 0);
    world.load_column(origin).unwrap();
    let stone = world.registry().by_key("stone").unwrap();
    world.set_block(BlockPos::new(3, 3, 3), stone, 0);
    for _ in 0..32 {
        world.tick();
    }
    assert!(world.column(origin).unwrap().relight_scheduler().is_exhausted());

    world.set_block(BlockPos::new(3, -30, 3), stone, 0);
    world.drain_light_updates();
    world.tick();

    let scheduler = world.column(origin).unwrap().relight_scheduler();
    assert_eq!(scheduler.snapshot_len(), 2);
    assert_eq!(scheduler.cursor(), CHECKS_PER_PASS);
    assert_eq!(relight_count(&world.drain_light_updates()), 8 * 16);
}

#[test]
fn test_emitter_in_neighbour_column_is_requested() {
    let mut world = world();
    world.load_column(ColumnPos::new(0, 0)).unwrap();
    world.load_column(ColumnPos::new(-1, 0)).unwrap();
    let stone = world.registry().by_key("stone").unwrap();
    let glowstone = world.registry().by_key("glowstone").unwrap();
    world.set_block(BlockPos::new(0, 0, 0), stone, 0);
    world.set_block(BlockPos::new(-1, 5, 0), glowstone, 0);
    world.drain_light_updates();

    world.tick();
    let updates = world.drain_light_updates();
    assert!(updates.contains(&LightUpdate::Relight(BlockPos::new(-1, 5, 0))));
    assert!(updates.contains(&LightUpdate::Relight(BlockPos::new(0, 5, 0))));
    assert!(!updates.contains(&LightUpdate::Relight(BlockPos::new(0, 0, 0))));
}

#[test]
fn test_removed_sub_chunk_leaves_lighting() {
    let mut world = world();
    let origin = ColumnPos::new(0, 0);
    world.load_column(origin).unwrap();
    let glass = world.registry().by_key("glass").unwrap();
    world.set_block(BlockPos::new(1, 20, 1), glass, 0);

    let pos = SubChunkPos::new(0, 1, 0);
    assert!(world.lighting().is_sub_chunk_resident(pos));
    assert!(world.remove_sub_chunk(pos));
    assert!(!world.lighting().is_sub_chunk_resident(pos));
    assert!(!world.remove_sub_chunk(pos));

    world.drain_light_updates();
    world.tick();
    assert_eq!(world.column(origin).unwrap().relight_scheduler().snapshot_len(), 0);
    assert!(world.drain_light_updates().is_empty());
}

#[test]
fn test_sky_light_settles_under_a_roof() {
    let mut world = world();
    for x in -1..=1 {
        for z in -1..=1 {
            world.load_column(ColumnPos::new(x, z)).unwrap();
        }
    }
    let stone = world.registry().by_key("stone").unwrap();
    world.set_block(BlockPos::new(4, 0, 4), stone, 0);
    assert_eq!(world.light(LightType::Sky, BlockPos::new(4, 1, 4)), 15);

    world.set_block(BlockPos::new(4, 10, 4), stone, 0);
    assert_eq!(world.light(LightType::Sky, BlockPos::new(4, 9, 4)), 0);
    assert_eq!(world.light(LightType::Sky, BlockPos::new(4, 11, 4)), 15);

    let updates = world.drain_light_updates();
    assert!(updates.contains(&LightUpdate::Check {
        kind: LightType::Sky,
        pos: BlockPos::new(4, 5, 4),
    }));
    assert!(updates.contains(&LightUpdate::Check {
        kind: LightType::Sky,
        pos: BlockPos::new(5, 10, 4),
    }));
}
