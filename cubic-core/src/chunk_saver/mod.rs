//! Column persistence.

pub mod disk;
pub mod ram_only;
pub mod storage;

pub use disk::DiskStorage;
pub use ram_only::RamOnlyStorage;
pub use storage::ChunkStorage;
