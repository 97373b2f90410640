//! The closed set of normalized-difference products

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::band::BandRole;
use crate::error::Error;

/// Index product computed as `(a - b) / (a + b)` over two bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// NDVI: `(NIR - Red) / (NIR + Red)`
    #[serde(alias = "ndvi")]
    Vegetation,
    /// NDWI (McFeeters): `(Green - NIR) / (Green + NIR)`
    #[serde(alias = "ndwi")]
    Water,
}

impl IndexKind {
    pub const ALL: &[IndexKind] = &[Self::Vegetation, Self::Water];

    /// Band in the positive term of the numerator
    pub fn numerator(&self) -> BandRole {
        match self {
            Self::Vegetation => BandRole::Nir,
            Self::Water => BandRole::Green,
        }
    }

    /// Band subtracted in the numerator
    pub fn denominator(&self) -> BandRole {
        match self {
            Self::Vegetation => BandRole::Red,
            Self::Water => BandRole::Nir,
        }
    }

    /// Both roles, numerator first
    pub fn roles(&self) -> [BandRole; 2] {
        [self.numerator(), self.denominator()]
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Vegetation => "NDVI",
            Self::Water => "NDWI",
        }
    }

    /// Title of the overlay layer handed to the map
    pub fn layer_title(&self) -> &'static str {
        match self {
            Self::Vegetation => "NDVI Layer",
            Self::Water => "NDWI Layer",
        }
    }

    /// Viewport fit animation length in milliseconds
    pub fn default_fit_duration_ms(&self) -> u64 {
        match self {
            Self::Vegetation => 5000,
            Self::Water => 2000,
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for IndexKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vegetation" | "ndvi" => Ok(Self::Vegetation),
            "water" | "ndwi" => Ok(Self::Water),
            other => Err(Error::Other(format!("unknown index kind '{}'", other))),
        }
    }
}
