//! # Cubic Utils
//!
//! Coordinate types, the spatial hash map and small serialization helpers shared by
//! the column engine.
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

pub mod coords;
pub mod locks;
pub mod serial;
pub mod types;
pub mod xyz_map;

pub use types::{BlockPos, ColumnPos, SubChunkPos};
pub use xyz_map::{XyzAddressable, XyzMap, XyzMapError};
