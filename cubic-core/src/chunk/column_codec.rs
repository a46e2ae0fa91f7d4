//! Column snapshots, the byte layout shared by persistence and network transfer.
//!
//! ```text
//! u16                    sub-chunk count
//! per sub-chunk, bottom to top:
//!   i16                  vertical index
//!   [u8; 4096]           low id bytes
//!   u8                   high nibble flag, followed by [u8; 2048] when nonzero
//!   [u8; 2048]           metadata
//!   [u8; 2048]           block light
//!   [u8; 2048]           sky light, only in worlds with a sky
//!   [u8; 256]            biomes, only in a first transfer
//! opacity index
//! ```
//!
//! The vertical index is signed so that sub-chunks below zero survive a round trip.
//! Streams from writers that store it as an unsigned 16-bit value read back
//! indices 32768 and up as negative heights.

use std::io::{Read, Write};

use cubic_utils::serial::{ReadFrom, WriteTo};

use crate::block::BlockRegistry;
use crate::chunk::{column::Column, nibble_array::NibbleArray, opacity_index::OpacityIndex};
use crate::error::{ColumnReadError, ColumnWriteError};

impl Column {
    /// Encodes every resident sub-chunk and the opacity index into a new buffer.
    pub fn encode(&self, first_time: bool) -> Result<Vec<u8>, ColumnWriteError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf, first_time)?;
        Ok(buf)
    }

    /// Writes a snapshot of every resident sub-chunk and the opacity index.
    ///
    /// Biomes are repeated after each sub-chunk when `first_time` is set.
    pub fn write_to(&self, writer: &mut impl Write, first_time: bool) -> Result<(), ColumnWriteError> {
        let count = u16::try_from(self.sub_chunks.len())
            .map_err(|_| ColumnWriteError::TooManySubChunks(self.sub_chunks.len()))?;
        count.write(writer)?;

        for sub_chunk in self.sub_chunks.iter() {
            let y = i16::try_from(sub_chunk.y())
                .map_err(|_| ColumnWriteError::SubChunkOutOfRange(sub_chunk.y()))?;
            y.write(writer)?;

            let storage = sub_chunk.storage().read();
            writer.write_all(storage.block_lsb())?;
            match storage.block_msb() {
                Some(msb) => {
                    true.write(writer)?;
                    msb.write_to(writer)?;
                }
                None => false.write(writer)?,
            }
            storage.metadata_array().write_to(writer)?;
            storage.block_light_array().write_to(writer)?;
            if self.has_sky {
                match storage.sky_light_array() {
                    Some(sky) => sky.write_to(writer)?,
                    None => NibbleArray::new_filled(15).write_to(writer)?,
                }
            }
            if first_time {
                writer.write_all(&self.biomes[..])?;
            }
        }

        self.opacity.write_to(writer)
    }

    /// Decodes a snapshot into this column.
    ///
    /// Sub-chunks in the snapshot are created when missing and overwritten otherwise.
    /// Unknown block ids are replaced with air. On success the column counts as lit and
    /// populated; on failure it may be half filled and should be discarded.
    pub fn read_from(
        &mut self,
        data: &mut impl Read,
        first_time: bool,
        registry: &impl BlockRegistry,
    ) -> Result<(), ColumnReadError> {
        match self.read_snapshot(data, first_time, registry) {
            Ok(()) => {
                self.light_populated = true;
                self.terrain_populated = true;
                Ok(())
            }
            Err(err) => {
                log::error!(
                    "Failed to read data for column {},{}: {err}",
                    self.pos.x,
                    self.pos.z
                );
                Err(err)
            }
        }
    }

    fn read_snapshot(
        &mut self,
        data: &mut impl Read,
        first_time: bool,
        registry: &impl BlockRegistry,
    ) -> Result<(), ColumnReadError> {
        let count = u16::read(data)?;
        if count > 0 {
            self.relight.invalidate();
        }

        for _ in 0..count {
            let y = i32::from(i16::read(data)?);
            let sub_chunk = self.sub_chunks.get_or_create(y);
            let mut storage = sub_chunk.storage().write();

            data.read_exact(&mut storage.block_lsb_mut()[..])?;
            if bool::read(data)? {
                storage.set_block_msb(Some(NibbleArray::read_from(data)?));
            } else {
                storage.set_block_msb(None);
            }
            storage.set_metadata_array(NibbleArray::read_from(data)?);
            storage.set_block_light_array(NibbleArray::read_from(data)?);
            if self.has_sky {
                storage.set_sky_light_array(Some(NibbleArray::read_from(data)?));
            }
            if first_time {
                data.read_exact(&mut self.biomes[..])?;
            }

            storage.remove_invalid_blocks(registry);
        }

        self.opacity = OpacityIndex::read_from(data)?;
        self.clear_precipitation();
        Ok(())
    }

    /// Builds a column from a snapshot.
    pub fn decode(
        mut self,
        bytes: &[u8],
        first_time: bool,
        registry: &impl BlockRegistry,
    ) -> Result<Self, ColumnReadError> {
        let mut data = bytes;
        self.read_from(&mut data, first_time, registry)?;
        Ok(self)
    }
}
