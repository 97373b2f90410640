//! # ndlayer Colormap
//!
//! Turns index rasters into renderable images.
//!
//! Each [`IndexKind`](ndlayer_core::IndexKind) owns an ordered threshold
//! table ([`ClassTable`]); [`classify`] maps every index sample to an opaque
//! RGBA color and [`compose`] packs the result into an [`ImageAsset`] that
//! can be encoded as PNG or a `data:` URL.
//!
//! ## Usage
//!
//! ```ignore
//! use ndlayer_colormap::{classify, compose};
//! use ndlayer_core::IndexKind;
//!
//! let colors = classify(&ndvi, IndexKind::Vegetation);
//! let image = compose(&colors)?;
//! let png = image.to_png()?;
//! ```

mod compose;
mod render;
mod scheme;

pub use compose::{compose, ImageAsset};
pub use render::{classify, classify_with, ColorRaster};
pub use scheme::{ClassRule, ClassTable, Rgb, Threshold};
