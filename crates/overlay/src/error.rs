//! Pipeline error taxonomy.
//!
//! Every failure carries an [`ErrorKind`] and is reported together with the
//! [`Stage`] it happened in. Errors are `Clone` so one decode failure can be
//! reported by every index kind that needed the band.

use std::fmt;

use ndlayer_cloud::CloudError;
use ndlayer_core::{BandRole, IndexKind};
use thiserror::Error;

use crate::publisher::SinkError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("invalid archive: {0}")]
    Archive(String),

    #[error("no archive entry matches the {role} band pattern")]
    MissingBand { role: BandRole },

    #[error("cannot decode {entry}: {reason}")]
    Decode { entry: String, reason: String },

    #[error("bands are not aligned: {0}")]
    ShapeMismatch(String),

    #[error("invalid sample type: {0}")]
    InvalidSampleType(String),

    #[error("reprojection failed: {0}")]
    Reprojection(String),

    #[error("image composition failed: {0}")]
    Compose(String),

    #[error("publish failed: {0}")]
    Publish(#[from] SinkError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Fetch,
    Archive,
    MissingBand,
    Decode,
    ShapeMismatch,
    InvalidSampleType,
    Reprojection,
    Compose,
    Publish,
    Config,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::Archive(_) => ErrorKind::Archive,
            Self::MissingBand { .. } => ErrorKind::MissingBand,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::ShapeMismatch(_) => ErrorKind::ShapeMismatch,
            Self::InvalidSampleType(_) => ErrorKind::InvalidSampleType,
            Self::Reprojection(_) => ErrorKind::Reprojection,
            Self::Compose(_) => ErrorKind::Compose,
            Self::Publish(_) => ErrorKind::Publish,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Decode failure of one archive entry
    pub fn decode(entry: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::Decode {
            entry: entry.into(),
            reason: err.to_string(),
        }
    }
}

impl From<ndlayer_core::Error> for PipelineError {
    fn from(e: ndlayer_core::Error) -> Self {
        use ndlayer_core::Error as E;
        match e {
            E::SizeMismatch { .. }
            | E::SampleCountMismatch { .. }
            | E::CrsMismatch(..)
            | E::InvalidDimensions { .. }
            | E::IndexOutOfBounds { .. } => Self::ShapeMismatch(e.to_string()),
            E::InvalidSampleType { .. } => Self::InvalidSampleType(e.to_string()),
            E::Decode(reason) | E::UnsupportedDataType(reason) => Self::Decode {
                entry: "band".into(),
                reason,
            },
            E::Encode(reason) => Self::Compose(reason),
            E::Other(reason) => Self::Config(reason),
        }
    }
}

impl From<CloudError> for PipelineError {
    fn from(e: CloudError) -> Self {
        match e {
            CloudError::Http(_)
            | CloudError::Network(_)
            | CloudError::Io(_)
            | CloudError::Service(_) => Self::Fetch(e.to_string()),
            CloudError::Archive(reason) => Self::Archive(reason),
            CloudError::MissingBand { role } => Self::MissingBand { role },
            CloudError::Pattern { .. } => Self::Config(e.to_string()),
            CloudError::UnsupportedCrs(_) | CloudError::Reprojection(_) => {
                Self::Reprojection(e.to_string())
            }
            CloudError::Core(core) => core.into(),
        }
    }
}

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Fetch,
    Extract,
    Decode,
    Validate,
    Compute,
    Classify,
    Compose,
    Reproject,
    Publish,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::Decode => "decode",
            Self::Validate => "validate",
            Self::Compute => "compute",
            Self::Classify => "classify",
            Self::Compose => "compose",
            Self::Reproject => "reproject",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failure located in the pipeline. `kind` is `None` for run-wide stages.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub kind: Option<IndexKind>,
    pub stage: Stage,
    pub error: PipelineError,
}

impl StageFailure {
    pub fn new(kind: Option<IndexKind>, stage: Stage, error: PipelineError) -> Self {
        Self { kind, stage, error }
    }

    pub fn error_kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "{} {} stage: {}", kind, self.stage, self.error),
            None => write!(f, "{} stage: {}", self.stage, self.error),
        }
    }
}

impl std::error::Error for StageFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
