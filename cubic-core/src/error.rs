//! Error types surfaced by the column engine.

use std::io;

use cubic_utils::XyzMapError;
use thiserror::Error;

/// Failure while decoding a column snapshot.
///
/// The column may be left partially populated; it should be reloaded rather than trusted.
#[derive(Debug, Error)]
pub enum ColumnReadError {
    /// The stream ended early or could not be read.
    #[error("failed to read column snapshot: {0}")]
    Io(#[from] io::Error),
    /// An opacity column whose runs are unordered or do not end transparent.
    #[error("malformed opacity runs at column position {position}")]
    MalformedOpacityIndex {
        /// The `z * 16 + x` index of the offending position.
        position: usize,
    },
}

/// Failure while encoding a column snapshot.
#[derive(Debug, Error)]
pub enum ColumnWriteError {
    /// The underlying writer failed.
    #[error("failed to write column snapshot: {0}")]
    Io(#[from] io::Error),
    /// The vertical index does not fit the 16-bit snapshot field.
    #[error("sub-chunk index {0} does not fit in 16 bits")]
    SubChunkOutOfRange(i32),
    /// More sub-chunks than the 16-bit count field can describe.
    #[error("column has {0} sub-chunks, at most 65535 fit in a snapshot")]
    TooManySubChunks(usize),
    /// An opacity column with more runs than the 16-bit count field can describe.
    #[error("opacity column {position} has {runs} runs")]
    TooManyOpacityRuns {
        /// The `z * 16 + x` index of the offending position.
        position: usize,
        /// The number of runs.
        runs: usize,
    },
}

/// Failure of a column storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File system failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A stored snapshot could not be decoded.
    #[error(transparent)]
    Read(#[from] ColumnReadError),
    /// A column could not be encoded.
    #[error(transparent)]
    Write(#[from] ColumnWriteError),
}

/// Failure while loading the world configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The file is not valid JSON5 for the config schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json5::Error),
    /// The file parsed but holds an out-of-range value.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Failure while registering a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// All 4096 legacy ids are taken.
    #[error("no free block ids left")]
    Full,
    /// A block with this key already exists.
    #[error("block {0} is already registered")]
    DuplicateKey(String),
}

/// Failure while creating a world.
#[derive(Debug, Error)]
pub enum WorldError {
    /// The sub-chunk map rejected its configuration.
    #[error(transparent)]
    Map(#[from] XyzMapError),
    /// The storage backend could not be opened.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
