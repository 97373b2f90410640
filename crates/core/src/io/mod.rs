//! GeoTIFF reading and writing for single-band rasters
//!
//! Buffer-based so archive entries never touch the filesystem.

mod geotiff;

pub use geotiff::{decode_band, encode_band};
