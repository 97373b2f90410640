//! Error types for ndlayer core

use thiserror::Error;

/// Main error type for raster and band operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Sample count mismatch for {band}: {width}x{height} needs {expected} samples, found {found}")]
    SampleCountMismatch {
        band: String,
        width: usize,
        height: usize,
        expected: usize,
        found: usize,
    },

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Invalid sample type for {band}: expected {expected}, found {found}")]
    InvalidSampleType {
        band: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("TIFF decode error: {0}")]
    Decode(String),

    #[error("Image encode error: {0}")]
    Encode(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for ndlayer core operations
pub type Result<T> = std::result::Result<T, Error>;
