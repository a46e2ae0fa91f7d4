//! Columns, their sub-chunks and the per-column lighting bookkeeping.

pub mod block_storage;
pub mod column;
pub mod column_codec;
pub mod column_lighting;
pub mod direction;
pub mod entity_container;
pub mod light_type;
pub mod nibble_array;
pub mod opacity_index;
pub mod relight;
pub mod sub_chunk;
pub mod sub_chunk_index;
