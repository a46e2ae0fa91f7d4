//! The two light channels stored per voxel.

/// A light channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    /// Light coming from open sky.
    Sky,
    /// Light coming from emitting blocks.
    Block,
}

impl LightType {
    /// Value assumed for positions whose sub-chunk is not resident but which see the sky.
    #[must_use]
    pub const fn default_value(self) -> u8 {
        match self {
            Self::Sky => 15,
            Self::Block => 0,
        }
    }
}
