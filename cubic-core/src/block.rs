//! Block identifiers and the registry supplying their lighting properties.

use rustc_hash::FxHashMap;

use crate::error::RegistryError;

/// A legacy block id: a low byte plus a high nibble, 12 bits in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockId(pub u16);

impl BlockId {
    /// The empty block.
    pub const AIR: Self = Self(0);
    /// The largest representable id.
    pub const MAX: u16 = 0x0FFF;

    /// Combines the low byte and the high nibble.
    #[must_use]
    pub const fn from_parts(low: u8, high: u8) -> Self {
        Self(((high as u16 & 0x0F) << 8) | low as u16)
    }

    /// The low eight bits.
    #[must_use]
    pub const fn low(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// The high four bits.
    #[must_use]
    pub const fn high(self) -> u8 {
        ((self.0 >> 8) & 0x0F) as u8
    }

    /// Whether this is [`BlockId::AIR`].
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }
}

/// Lighting and weather properties of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockProperties {
    /// How much light the block removes, 0 for transparent and 255 for fully opaque.
    pub light_opacity: u8,
    /// Light emitted by the block, 0-15.
    pub light_emission: u8,
    /// Whether rain and snow stop at this block.
    pub blocks_precipitation: bool,
}

impl BlockProperties {
    /// Properties of air.
    pub const AIR: Self = Self {
        light_opacity: 0,
        light_emission: 0,
        blocks_precipitation: false,
    };

    /// A fully opaque, solid block.
    pub const OPAQUE: Self = Self {
        light_opacity: 255,
        light_emission: 0,
        blocks_precipitation: true,
    };

    /// A solid block letting all light through, like glass.
    pub const TRANSPARENT: Self = Self {
        light_opacity: 0,
        light_emission: 0,
        blocks_precipitation: true,
    };
}

/// Source of per-block properties consumed by the column engine.
pub trait BlockRegistry {
    /// Properties of a registered block, `None` for unknown ids.
    fn properties(&self, id: BlockId) -> Option<BlockProperties>;

    /// Light opacity, 0 for unknown ids.
    fn light_opacity(&self, id: BlockId) -> u8 {
        self.properties(id).map_or(0, |p| p.light_opacity)
    }

    /// Light emission, 0 for unknown ids.
    fn light_emission(&self, id: BlockId) -> u8 {
        self.properties(id).map_or(0, |p| p.light_emission)
    }

    /// Whether precipitation stops at this block.
    fn blocks_precipitation(&self, id: BlockId) -> bool {
        self.properties(id).is_some_and(|p| p.blocks_precipitation)
    }

    /// Whether the id names a registered block.
    fn is_valid(&self, id: BlockId) -> bool {
        self.properties(id).is_some()
    }
}

/// In-memory block registry with lookup by id and key.
#[derive(Debug, Clone)]
pub struct BlockTable {
    blocks_by_id: Vec<BlockProperties>,
    ids_by_key: FxHashMap<String, BlockId>,
}

impl Default for BlockTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockTable {
    /// Creates a table holding only air, at id 0.
    #[must_use]
    pub fn new() -> Self {
        let mut ids_by_key = FxHashMap::default();
        ids_by_key.insert("air".to_owned(), BlockId::AIR);
        Self {
            blocks_by_id: vec![BlockProperties::AIR],
            ids_by_key,
        }
    }

    /// Creates a table with a small set of common blocks.
    ///
    /// Registered keys: `stone`, `dirt`, `grass`, `bedrock`, `glass`, `water`, `ice`,
    /// `leaves`, `torch` and `glowstone`.
    #[must_use]
    pub fn with_common_blocks() -> Self {
        let mut table = Self::new();
        let blocks = [
            ("stone", BlockProperties::OPAQUE),
            ("dirt", BlockProperties::OPAQUE),
            ("grass", BlockProperties::OPAQUE),
            ("bedrock", BlockProperties::OPAQUE),
            ("glass", BlockProperties::TRANSPARENT),
            (
                "water",
                BlockProperties {
                    light_opacity: 3,
                    light_emission: 0,
                    blocks_precipitation: true,
                },
            ),
            (
                "ice",
                BlockProperties {
                    light_opacity: 3,
                    light_emission: 0,
                    blocks_precipitation: true,
                },
            ),
            (
                "leaves",
                BlockProperties {
                    light_opacity: 1,
                    light_emission: 0,
                    blocks_precipitation: true,
                },
            ),
            (
                "torch",
                BlockProperties {
                    light_opacity: 0,
                    light_emission: 14,
                    blocks_precipitation: false,
                },
            ),
            (
                "glowstone",
                BlockProperties {
                    light_opacity: 255,
                    light_emission: 15,
                    blocks_precipitation: true,
                },
            ),
        ];
        for (key, properties) in blocks {
            // a fresh table always has room for these
            let _ = table.register(key, properties);
        }
        table
    }

    /// Registers a block under the next free id.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        properties: BlockProperties,
    ) -> Result<BlockId, RegistryError> {
        let key = key.into();
        if self.ids_by_key.contains_key(&key) {
            return Err(RegistryError::DuplicateKey(key));
        }
        let raw = u16::try_from(self.blocks_by_id.len()).map_err(|_| RegistryError::Full)?;
        if raw > BlockId::MAX {
            return Err(RegistryError::Full);
        }

        let id = BlockId(raw);
        self.blocks_by_id.push(properties);
        self.ids_by_key.insert(key, id);
        Ok(id)
    }

    /// Gets a block id by its key.
    #[must_use]
    pub fn by_key(&self, key: &str) -> Option<BlockId> {
        self.ids_by_key.get(key).copied()
    }

    /// Returns the number of registered blocks, air included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks_by_id.len()
    }

    /// Always false, air is registered on creation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks_by_id.is_empty()
    }

    /// Iterates over all blocks with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &BlockProperties)> + '_ {
        self.blocks_by_id
            .iter()
            .enumerate()
            .map(|(id, properties)| (BlockId(id as u16), properties))
    }
}

impl BlockRegistry for BlockTable {
    fn properties(&self, id: BlockId) -> Option<BlockProperties> {
        self.blocks_by_id.get(usize::from(id.0)).copied()
    }
}
