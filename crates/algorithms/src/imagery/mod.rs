//! Imagery analysis algorithms
//!
//! - Band validation: shape, sample count and sample type checks on a pair
//! - Normalized difference: generic two-band index, NDVI and NDWI

mod indices;
mod validate;

pub use indices::{compute_index, ndvi, ndwi, normalized_difference};
pub use validate::{validate, BandPair};
