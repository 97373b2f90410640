//! Error types for archive access and reprojection.

use ndlayer_core::BandRole;
use thiserror::Error;

/// Errors produced while fetching, unpacking or reprojecting.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid archive: {0}")]
    Archive(String),

    #[error("no archive entry matches the {role} band pattern")]
    MissingBand { role: BandRole },

    #[error("invalid band pattern for {role}: {reason}")]
    Pattern { role: BandRole, reason: String },

    #[error("imagery service error: {0}")]
    Service(String),

    #[error("unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("reprojection failed: {0}")]
    Reprojection(String),

    #[error("core error: {0}")]
    Core(#[from] ndlayer_core::Error),
}

impl From<zip::result::ZipError> for CloudError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Archive(e.to_string())
    }
}

/// Result alias for cloud operations.
pub type Result<T> = std::result::Result<T, CloudError>;
