//! # Cubic Core
//!
//! Columns of unbounded height split into sparse 16x16x16 sub-chunks, with the
//! opacity record, sky light bookkeeping and relight scheduling that keep them lit.
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

pub mod block;
pub mod chunk;
pub mod chunk_saver;
/// World configuration.
pub mod config;
pub mod error;
pub mod world;

pub use chunk::column::Column;
pub use world::World;
