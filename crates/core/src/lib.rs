//! # ndlayer Core
//!
//! Core types and I/O for the ndlayer band-index overlay pipeline.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced grid, used for derived index rasters
//! - `RasterBand`: A decoded single-band raster with its declared sample type
//! - `GeoTransform` / `Extent`: Affine georeferencing and bounding boxes
//! - `CRS`: EPSG-coded coordinate reference systems
//! - `IndexKind` / `BandRole`: The closed set of index products and band roles
//! - GeoTIFF decoding from in-memory buffers

pub mod band;
pub mod crs;
pub mod error;
pub mod index;
pub mod io;
pub mod raster;

pub use band::{BandRole, RasterBand, SampleBuffer, SampleType};
pub use crs::CRS;
pub use error::{Error, Result};
pub use index::IndexKind;
pub use raster::{Extent, GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::band::{BandRole, RasterBand, SampleBuffer, SampleType};
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::index::IndexKind;
    pub use crate::raster::{Extent, GeoTransform, Raster, RasterElement};
}
