//! # ndlayer Algorithms
//!
//! Per-pixel band math for the overlay pipeline.
//!
//! - **imagery**: band-pair validation and normalized-difference indices
//!   (NDVI, NDWI)

pub mod imagery;
mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::imagery::{
        compute_index, ndvi, ndwi, normalized_difference, validate, BandPair,
    };
    pub use ndlayer_core::prelude::*;
}
