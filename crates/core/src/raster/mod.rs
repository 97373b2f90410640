//! Raster data structures and georeferencing

mod element;
mod extent;
mod geotransform;
mod grid;

pub use element::RasterElement;
pub use extent::Extent;
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
