//! Block writes and the sky light bookkeeping they trigger.
//!
//! A write that creates a sub-chunk recomputes the whole sky light map of the column.
//! Any other write that moves the top non-transparent block of its block column
//! relights the span between the old and new top in place and asks the light engine to
//! recheck the neighbours.

use std::iter;

use cubic_utils::{
    BlockPos, SubChunkPos,
    coords::{block_to_local, block_to_sub_chunk},
};

use crate::block::{BlockId, BlockRegistry};
use crate::chunk::{column::Column, direction::Direction, light_type::LightType};
use crate::world::WorldContext;

/// Sky light of a block open to the sky.
const FULL_SKY_LIGHT: i32 = 15;

/// Radius checked around a block column before asking neighbours to relight.
const NEIGHBOUR_LOADED_RADIUS: i32 = 16;

impl Column {
    /// Writes a block and its metadata at a world position inside this column.
    ///
    /// Returns true if the stored block or metadata changed. Writing air where no
    /// sub-chunk is resident does nothing.
    pub fn set_block(
        &mut self,
        pos: BlockPos,
        id: BlockId,
        metadata: u8,
        registry: &impl BlockRegistry,
        ctx: &mut impl WorldContext,
    ) -> bool {
        debug_assert_eq!(pos.column(), self.pos, "block {pos} is outside column {}", self.pos);

        let (local_x, y, local_z) = pos.column_local();
        let sub_chunk_y = block_to_sub_chunk(y);

        let created = !self.sub_chunks.contains(sub_chunk_y);
        if created {
            if id.is_air() {
                return false;
            }
            self.sub_chunks.add_empty(sub_chunk_y);
            self.relight.invalidate();
            ctx.on_sub_chunk_created(SubChunkPos::new(self.pos.x, sub_chunk_y, self.pos.z));
        }

        let Some(sub_chunk) = self.sub_chunks.get(sub_chunk_y) else {
            return false;
        };
        let local_y = block_to_local(y);
        let old_id = sub_chunk.block(local_x, local_y, local_z);
        if !sub_chunk.set_block(local_x, local_y, local_z, id, metadata) {
            return false;
        }

        self.invalidate_precipitation_at(local_x, y, local_z);

        let new_opacity = registry.light_opacity(id);
        if created {
            self.opacity.set_opacity(local_x, y, local_z, new_opacity);
            self.generate_skylight_map();
        } else {
            let old_opacity = registry.light_opacity(old_id);
            let old_height = self.height_or_floor(local_x, local_z);
            self.opacity.set_opacity(local_x, y, local_z, new_opacity);
            let new_height = self.height_or_floor(local_x, local_z);

            if old_height != new_height {
                self.update_block_skylight(local_x, local_z, old_height, new_height, ctx);
            }

            if old_opacity != new_opacity
                && (new_opacity < old_opacity
                    || self.light(LightType::Sky, local_x, y, local_z) > 0
                    || self.light(LightType::Block, local_x, y, local_z) > 0)
            {
                self.propagate_skylight_occlusion(pos, ctx);
            }
        }

        self.modified = true;
        true
    }

    /// Recomputes the sky light of every resident sub-chunk from scratch.
    ///
    /// Each block column starts at full light above the top filled segment and loses
    /// the recorded opacity per block on the way down. Once any light has been lost,
    /// transparent blocks cost one level too. Below the point where light runs out
    /// everything is dark.
    pub fn generate_skylight_map(&mut self) {
        self.clear_precipitation();
        if !self.has_sky {
            return;
        }

        let (Some(min_y), Some(resident_top)) =
            (self.min_resident_block_y(), self.max_resident_block_y())
        else {
            return;
        };
        let max_y = self
            .top_filled_segment()
            .map_or(resident_top, |segment| (segment + 15).max(resident_top));

        for local_x in 0..16 {
            for local_z in 0..16 {
                let mut light = FULL_SKY_LIGHT;
                for y in (min_y..=max_y).rev() {
                    let mut opacity = i32::from(self.opacity.opacity(local_x, y, local_z));
                    if opacity == 0 && light != FULL_SKY_LIGHT {
                        opacity = 1;
                    }
                    light -= opacity;

                    if light <= 0 {
                        for dark_y in min_y..=y {
                            self.write_sky_light(local_x, dark_y, local_z, 0);
                        }
                        break;
                    }
                    self.write_sky_light(local_x, y, local_z, light as u8);
                }
            }
        }

        self.modified = true;
    }

    /// The height value of a block column, or the floor of the lowest resident
    /// sub-chunk when nothing opaque is recorded.
    fn height_or_floor(&self, local_x: usize, local_z: usize) -> i32 {
        self.height_value(local_x, local_z)
            .unwrap_or_else(|| self.min_resident_block_y().unwrap_or(0))
    }

    /// Relights one block column after its top moved from `old_height` to `new_height`.
    ///
    /// Heights between the two are fully lit when the top went down and dark when it went
    /// up. Below the new top, light falls off by at least one level per block. The light
    /// engine is then asked to recheck the span here and in the four horizontal
    /// neighbours whose surroundings are loaded.
    fn update_block_skylight(
        &mut self,
        local_x: usize,
        local_z: usize,
        old_height: i32,
        new_height: i32,
        ctx: &mut impl WorldContext,
    ) {
        let lower = old_height.min(new_height);
        let upper = old_height.max(new_height);

        if self.has_sky {
            let exposed = if new_height < old_height { 15 } else { 0 };
            for y in lower..upper {
                self.write_sky_light(local_x, y, local_z, exposed);
            }

            let floor = self.min_resident_block_y().unwrap_or(new_height);
            let mut light = FULL_SKY_LIGHT;
            for y in (floor..new_height).rev() {
                let opacity = i32::from(self.opacity.opacity(local_x, y, local_z)).max(1);
                light = (light - opacity).max(0);
                self.write_sky_light(local_x, y, local_z, light as u8);
                if light == 0 {
                    break;
                }
            }
        }

        if upper > lower {
            let origin = self.pos.block_at(local_x, lower, local_z);
            let targets = Direction::HORIZONTAL
                .iter()
                .map(|dir| dir.relative(origin))
                .chain(iter::once(origin));
            for target in targets {
                if !ctx.is_area_loaded(target, NEIGHBOUR_LOADED_RADIUS) {
                    continue;
                }
                for y in lower..upper {
                    ctx.request_light_update(LightType::Sky, BlockPos::new(target.x, y, target.z));
                }
            }
        }

        self.modified = true;
    }

    /// Asks the light engine to recheck the sky light beside a block whose opacity
    /// changed.
    fn propagate_skylight_occlusion(&self, pos: BlockPos, ctx: &mut impl WorldContext) {
        if !(self.has_sky && ctx.has_sky()) {
            return;
        }
        for dir in Direction::HORIZONTAL {
            ctx.request_light_update(LightType::Sky, dir.relative(pos));
        }
    }

    fn write_sky_light(&self, local_x: usize, y: i32, local_z: usize, value: u8) {
        if let Some(sub_chunk) = self.sub_chunks.get(block_to_sub_chunk(y)) {
            sub_chunk.set_light(LightType::Sky, local_x, block_to_local(y), local_z, value);
        }
    }
}
