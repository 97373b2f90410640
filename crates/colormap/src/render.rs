//! Index raster to RGBA classification.

use ndlayer_core::{IndexKind, Raster};
use rayon::prelude::*;

use crate::scheme::ClassTable;

/// Per-pixel opaque colors in row-major order, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorRaster {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<[u8; 4]>,
}

impl ColorRaster {
    /// Color at (row, col), `None` outside the grid
    pub fn pixel(&self, row: usize, col: usize) -> Option<[u8; 4]> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.rgba.get(row * self.width + col).copied()
    }

    /// Flatten to `width * height * 4` bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.rgba.iter().flatten().copied().collect()
    }
}

/// Classify an index raster with the table of `kind`.
pub fn classify(raster: &Raster<f64>, kind: IndexKind) -> ColorRaster {
    classify_with(raster, ClassTable::for_kind(kind))
}

/// Classify with an explicit table. Deterministic; rows run in parallel.
pub fn classify_with(raster: &Raster<f64>, table: &ClassTable) -> ColorRaster {
    let (rows, cols) = raster.shape();
    let data = raster.data();

    let rgba: Vec<[u8; 4]> = (0..rows)
        .into_par_iter()
        .flat_map_iter(|row| {
            data.row(row)
                .iter()
                .map(|&v| table.color(v).to_rgba())
                .collect::<Vec<_>>()
        })
        .collect();

    ColorRaster {
        width: cols,
        height: rows,
        rgba,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vegetation_classes_in_row_order() {
        let r = Raster::from_vec(vec![0.5, 0.1, -0.4, f64::NAN], 2, 2).unwrap();
        let c = classify(&r, IndexKind::Vegetation);
        assert_eq!((c.width, c.height), (2, 2));
        assert_eq!(c.pixel(0, 0), Some([0, 128, 0, 255]));
        assert_eq!(c.pixel(0, 1), Some([255, 255, 0, 255]));
        assert_eq!(c.pixel(1, 0), Some([139, 69, 19, 255]));
        assert_eq!(c.pixel(1, 1), Some([139, 69, 19, 255]));
        assert_eq!(c.pixel(2, 0), None);
    }

    #[test]
    fn water_and_alpha() {
        let r = Raster::from_vec(vec![-0.5, -0.1, 0.0, 0.6, f64::NAN, 1.0], 2, 3).unwrap();
        let c = classify(&r, IndexKind::Water);
        assert!(c.rgba.iter().all(|px| px[3] == 255));
        assert_eq!(
            c.rgba,
            vec![
                [255, 255, 255, 255],
                [255, 255, 255, 255],
                [0, 0, 255, 255],
                [0, 0, 255, 255],
                [255, 255, 255, 255],
                [0, 0, 255, 255],
            ]
        );
        assert_eq!(c.to_bytes().len(), 24);
    }

    #[test]
    fn classification_is_deterministic() {
        let values: Vec<f64> = (0..400).map(|i| (i as f64 / 200.0) - 1.0).collect();
        let r = Raster::from_vec(values, 20, 20).unwrap();
        assert_eq!(
            classify(&r, IndexKind::Vegetation),
            classify(&r, IndexKind::Vegetation)
        );
    }
}
