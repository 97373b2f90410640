//! Archive locations and fetching.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::info;

use crate::error::Result;
use crate::http::HttpClient;

/// Where an imagery archive lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    Url(String),
    File(PathBuf),
}

impl ArchiveSource {
    /// `http://` and `https://` strings are URLs, anything else a path.
    pub fn parse(s: &str) -> Self {
        let lower = s.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(s.trim().to_string())
        } else {
            Self::File(PathBuf::from(s))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

impl FromStr for ArchiveSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for ArchiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Read the archive bytes from wherever `source` points.
pub async fn fetch_archive(source: &ArchiveSource, client: &HttpClient) -> Result<Vec<u8>> {
    let bytes = match source {
        ArchiveSource::Url(url) => client.fetch_bytes(url).await?,
        ArchiveSource::File(path) => tokio::fs::read(path).await?,
    };
    info!(%source, len = bytes.len(), "fetched archive");
    Ok(bytes)
}
