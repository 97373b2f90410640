//! Decoded single-band rasters
//!
//! A [`RasterBand`] is what the decoder produces for one archive entry: the
//! samples exactly as the file declared them, plus georeferencing. Nothing
//! here checks that the band is usable for index math; that is the
//! validator's job, so a band may carry e.g. `f32` samples or a sample count
//! that disagrees with its dimensions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crs::CRS;
use crate::error::Error;
use crate::raster::{Extent, GeoTransform};

/// Semantic role of a band inside a multispectral archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandRole {
    /// Red reflectance (Landsat 8 B4)
    Red,
    /// Green reflectance (Landsat 8 B3)
    Green,
    /// Near-infrared reflectance (Landsat 8 B5)
    Nir,
}

impl BandRole {
    pub const ALL: &[BandRole] = &[Self::Red, Self::Green, Self::Nir];

    /// Upper-case role name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Green => "GREEN",
            Self::Nir => "NIR",
        }
    }

    /// Filename pattern matched case-insensitively against archive entries
    pub fn default_pattern(&self) -> &'static str {
        match self {
            Self::Red => r".*B4.*\.tif$",
            Self::Green => r".*B3.*\.tif$",
            Self::Nir => r".*B5.*\.tif$",
        }
    }
}

impl fmt::Display for BandRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BandRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            "nir" => Ok(Self::Nir),
            other => Err(Error::Other(format!("unknown band role '{}'", other))),
        }
    }
}

/// Sample representation declared by the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl SampleType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Owned sample buffer in its declared representation
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl SampleBuffer {
    pub fn sample_type(&self) -> SampleType {
        match self {
            Self::U8(_) => SampleType::U8,
            Self::U16(_) => SampleType::U16,
            Self::U32(_) => SampleType::U32,
            Self::U64(_) => SampleType::U64,
            Self::I8(_) => SampleType::I8,
            Self::I16(_) => SampleType::I16,
            Self::I32(_) => SampleType::I32,
            Self::I64(_) => SampleType::I64,
            Self::F32(_) => SampleType::F32,
            Self::F64(_) => SampleType::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::U64(v) => v.len(),
            Self::I8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow as `u16` samples, `None` for any other representation
    pub fn as_u16(&self) -> Option<&[u16]> {
        match self {
            Self::U16(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Vec<u16>> for SampleBuffer {
    fn from(v: Vec<u16>) -> Self {
        Self::U16(v)
    }
}

/// One decoded band: samples, grid size, georeferencing.
#[derive(Debug, Clone)]
pub struct RasterBand {
    name: String,
    width: usize,
    height: usize,
    samples: SampleBuffer,
    transform: GeoTransform,
    crs: Option<CRS>,
}

impl RasterBand {
    /// Create an ungeoreferenced band. `samples` is not checked against
    /// `width * height`.
    pub fn new(
        name: impl Into<String>,
        width: usize,
        height: usize,
        samples: impl Into<SampleBuffer>,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            samples: samples.into(),
            transform: GeoTransform::default(),
            crs: None,
        }
    }

    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_crs(mut self, crs: Option<CRS>) -> Self {
        self.crs = crs;
        self
    }

    /// Archive entry the band was decoded from
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }

    pub fn sample_type(&self) -> SampleType {
        self.samples.sample_type()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// CRS recorded in the file's GeoKey directory, if any
    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Bounding box in the band's native CRS
    pub fn extent(&self) -> Extent {
        self.transform.extent(self.width, self.height)
    }
}
