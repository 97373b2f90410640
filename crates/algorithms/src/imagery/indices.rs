//! Normalized-difference indices
//!
//! Every product here is `(a - b) / (a + b)` over two validated `u16` bands,
//! evaluated in `f64`. A pixel whose sum is zero has no defined ratio and is
//! written as NaN, which is also the nodata value of the output raster.

use ndlayer_core::{IndexKind, Raster, RasterBand, Result};
use tracing::debug;

use super::validate::{validate, BandPair};
use crate::maybe_rayon::collect_rows;

/// Normalized difference of a pair: `(a - b) / (a + b)` per pixel.
///
/// The pair is validated first, so mismatched grids or non-`u16` samples
/// are reported before any math runs. Output carries the georeferencing of
/// `pair.a()`; values lie in `[-1, 1]` or are NaN where `a + b == 0`.
pub fn normalized_difference(pair: BandPair<'_>) -> Result<Raster<f64>> {
    let pair = validate(pair)?;
    let (a, b) = pair.u16_samples()?;
    let band = pair.a();
    let (rows, cols) = band.shape();

    let data = collect_rows(rows, |row| {
        let start = row * cols;
        a[start..start + cols]
            .iter()
            .zip(&b[start..start + cols])
            .map(|(&a, &b)| ratio(a, b))
            .collect()
    });

    debug!(
        roles = ?pair.roles(),
        rows,
        cols,
        "computed normalized difference"
    );

    output_raster(band, data, rows, cols)
}

/// NDVI: `(NIR - Red) / (NIR + Red)`
pub fn ndvi(nir: &RasterBand, red: &RasterBand) -> Result<Raster<f64>> {
    normalized_difference(BandPair::for_kind(IndexKind::Vegetation, nir, red))
}

/// NDWI (McFeeters): `(Green - NIR) / (Green + NIR)`
pub fn ndwi(green: &RasterBand, nir: &RasterBand) -> Result<Raster<f64>> {
    normalized_difference(BandPair::for_kind(IndexKind::Water, green, nir))
}

/// Compute `kind` from a pair already ordered as `kind.roles()`
pub fn compute_index(kind: IndexKind, pair: BandPair<'_>) -> Result<Raster<f64>> {
    match kind {
        IndexKind::Vegetation => ndvi(pair.a(), pair.b()),
        IndexKind::Water => ndwi(pair.a(), pair.b()),
    }
}

#[inline]
fn ratio(a: u16, b: u16) -> f64 {
    let (a, b) = (a as f64, b as f64);
    let sum = a + b;
    if sum == 0.0 {
        f64::NAN
    } else {
        (a - b) / sum
    }
}

fn output_raster(
    band: &RasterBand,
    data: Vec<f64>,
    rows: usize,
    cols: usize,
) -> Result<Raster<f64>> {
    let mut out = Raster::from_vec(data, rows, cols)?;
    out.set_transform(*band.transform());
    out.set_crs(band.crs().cloned());
    out.set_nodata(Some(f64::NAN));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndlayer_core::{Error, GeoTransform, SampleBuffer, CRS};

    fn band(name: &str, width: usize, height: usize, samples: Vec<u16>) -> RasterBand {
        RasterBand::new(name, width, height, samples)
    }

    #[test]
    fn ndvi_two_by_two() {
        let nir = band("B5.tif", 2, 2, vec![200, 100, 50, 0]);
        let red = band("B4.tif", 2, 2, vec![100, 100, 150, 0]);
        let out = ndvi(&nir, &red).unwrap();

        assert_eq!(out.shape(), (2, 2));
        assert_relative_eq!(out.get(0, 0).unwrap(), 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(out.get(0, 1).unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(out.get(1, 0).unwrap(), -0.5, epsilon = 1e-12);
        assert!(out.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn ndwi_uses_green_over_nir() {
        let green = band("B3.tif", 1, 2, vec![300, 10]);
        let nir = band("B5.tif", 1, 2, vec![100, 30]);
        let out = ndwi(&green, &nir).unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(out.get(1, 0).unwrap(), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn swapping_operands_negates() {
        let a = band("a", 3, 1, vec![7, 1000, 65535]);
        let b = band("b", 3, 1, vec![3, 1, 0]);
        let ab = normalized_difference(BandPair::for_kind(IndexKind::Vegetation, &a, &b)).unwrap();
        let ba = normalized_difference(BandPair::for_kind(IndexKind::Vegetation, &b, &a)).unwrap();
        for (x, y) in ab.iter().zip(ba.iter()) {
            assert_relative_eq!(*x, -*y, epsilon = 1e-12);
        }
    }

    #[test]
    fn values_stay_in_unit_range() {
        let a: Vec<u16> = (0..64).map(|i| (i * 1021) as u16).collect();
        let b: Vec<u16> = (0..64).map(|i| (65535 - i * 997) as u16).collect();
        let out = ndvi(&band("a", 8, 8, a), &band("b", 8, 8, b)).unwrap();
        for v in out.iter().filter(|v| !v.is_nan()) {
            assert!((-1.0..=1.0).contains(v), "{v}");
        }
    }

    #[test]
    fn all_zero_bands_give_nan() {
        let zeros = band("z", 4, 3, vec![0; 12]);
        let out = ndvi(&zeros, &zeros.clone()).unwrap();
        assert!(out.iter().all(|v| v.is_nan()));
        assert!(out.nodata().map(f64::is_nan).unwrap_or(false));
    }

    #[test]
    fn output_keeps_georeferencing() {
        let transform = GeoTransform::new(500_000.0, 4_000_000.0, 30.0, -30.0);
        let nir = band("B5.tif", 2, 1, vec![2, 2])
            .with_transform(transform)
            .with_crs(Some(CRS::utm(18, true)));
        let red = band("B4.tif", 2, 1, vec![1, 1]);
        let out = ndvi(&nir, &red).unwrap();
        assert_eq!(*out.transform(), transform);
        assert_eq!(out.crs().map(CRS::epsg), Some(32618));
    }

    #[test]
    fn invalid_pairs_are_rejected() {
        let nir = band("B5.tif", 2, 2, vec![1; 4]);
        let red = band("B4.tif", 3, 3, vec![1; 9]);
        assert!(matches!(ndvi(&nir, &red), Err(Error::SizeMismatch { .. })));

        let red = RasterBand::new("B4.tif", 2, 2, SampleBuffer::F32(vec![0.5; 4]));
        assert!(matches!(ndvi(&nir, &red), Err(Error::InvalidSampleType { .. })));
    }

    #[test]
    fn compute_index_dispatches() {
        let green = band("B3.tif", 1, 1, vec![30]);
        let nir = band("B5.tif", 1, 1, vec![10]);
        let pair = BandPair::for_kind(IndexKind::Water, &green, &nir);
        let out = compute_index(IndexKind::Water, pair).unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap(), 0.5, epsilon = 1e-12);
    }
}
