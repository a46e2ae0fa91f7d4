//! 4-bit packed per-voxel storage.
//!
//! Metadata, both light channels and the high block id bits all use half a byte per
//! voxel. A 16x16x16 sub-chunk therefore needs 2048 bytes per array. Arrays holding a
//! single value stay unallocated until a different value is written.

use std::io::{self, Read, Write};

/// Bytes needed to store one nibble for each of the 4096 voxels.
pub const NIBBLE_ARRAY_SIZE: usize = 2048;

/// Nibble storage for one sub-chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NibbleArray {
    /// Every voxel holds the same value (0-15).
    Homogeneous(u8),
    /// Packed values, two per byte, the even voxel in the low nibble.
    Heterogeneous(Box<[u8; NIBBLE_ARRAY_SIZE]>),
}

impl Default for NibbleArray {
    fn default() -> Self {
        Self::new_empty()
    }
}

#[inline]
const fn index(x: usize, y: usize, z: usize) -> usize {
    y << 8 | z << 4 | x
}

#[inline]
const fn packed(value: u8) -> u8 {
    (value & 0x0F) | ((value & 0x0F) << 4)
}

impl NibbleArray {
    /// Creates an array with every voxel at `value`.
    #[must_use]
    pub fn new_filled(value: u8) -> Self {
        debug_assert!(value <= 15, "Nibble value must be 0-15");
        Self::Homogeneous(value)
    }

    /// Creates an array of zeros.
    #[must_use]
    pub fn new_empty() -> Self {
        Self::Homogeneous(0)
    }

    /// Gets the value at the given local position.
    #[must_use]
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        debug_assert!(x < 16 && y < 16 && z < 16, "Coordinates must be 0-15");

        match self {
            Self::Homogeneous(value) => *value,
            Self::Heterogeneous(data) => {
                let index = index(x, y, z);
                let byte = data[index >> 1];
                if index & 1 == 1 {
                    byte >> 4
                } else {
                    byte & 0x0F
                }
            }
        }
    }

    /// Sets the value at the given local position.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: u8) {
        debug_assert!(x < 16 && y < 16 && z < 16, "Coordinates must be 0-15");
        debug_assert!(value <= 15, "Nibble value must be 0-15");

        if let Self::Homogeneous(current) = *self {
            if current == value {
                return;
            }
            *self = Self::Heterogeneous(Box::new([packed(current); NIBBLE_ARRAY_SIZE]));
        }

        if let Self::Heterogeneous(data) = self {
            let index = index(x, y, z);
            let byte = &mut data[index >> 1];
            if index & 1 == 1 {
                *byte = (*byte & 0x0F) | ((value & 0x0F) << 4);
            } else {
                *byte = (*byte & 0xF0) | (value & 0x0F);
            }
        }
    }

    /// Returns true if every voxel holds zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Homogeneous(value) => *value == 0,
            Self::Heterogeneous(data) => data.iter().all(|&b| b == 0),
        }
    }

    /// Writes the packed array, expanding a homogeneous value.
    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        match self {
            Self::Homogeneous(value) => writer.write_all(&[packed(*value); NIBBLE_ARRAY_SIZE]),
            Self::Heterogeneous(data) => writer.write_all(&data[..]),
        }
    }

    /// Reads a packed array, failing on a truncated stream.
    pub fn read_from(data: &mut impl Read) -> io::Result<Self> {
        let mut bytes = Box::new([0u8; NIBBLE_ARRAY_SIZE]);
        data.read_exact(&mut bytes[..])?;

        let first = bytes[0];
        if first >> 4 == first & 0x0F && bytes.iter().all(|&b| b == first) {
            Ok(Self::Homogeneous(first & 0x0F))
        } else {
            Ok(Self::Heterogeneous(bytes))
        }
    }
}
