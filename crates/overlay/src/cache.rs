//! Decoded bands shared by every index kind of a run.

use std::collections::BTreeMap;
use std::sync::Arc;

use ndlayer_cloud::Extraction;
use ndlayer_core::io::decode_band;
use ndlayer_core::{BandRole, IndexKind, RasterBand};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::PipelineError;

/// Each role decoded at most once, successful or not.
#[derive(Debug, Clone, Default)]
pub struct BandCache {
    bands: BTreeMap<BandRole, Result<Arc<RasterBand>, PipelineError>>,
}

impl BandCache {
    /// Decode the entries for `roles` in parallel. Unmatched roles are
    /// stored as [`PipelineError::MissingBand`], undecodable ones as
    /// [`PipelineError::Decode`].
    pub fn decode(extraction: &Extraction, roles: &[BandRole]) -> Self {
        let bands = roles
            .par_iter()
            .map(|&role| {
                let band = match extraction.entries.get(&role) {
                    Some(entry) => decode_band(&entry.name, &entry.bytes)
                        .map(Arc::new)
                        .map_err(|e| PipelineError::decode(&entry.name, e)),
                    None => Err(PipelineError::MissingBand { role }),
                };
                match &band {
                    Ok(b) => debug!(
                        %role,
                        entry = b.name(),
                        width = b.width(),
                        height = b.height(),
                        sample_type = %b.sample_type(),
                        "decoded band"
                    ),
                    Err(e) => warn!(%role, error = %e, "band unavailable"),
                }
                (role, band)
            })
            .collect();
        Self { bands }
    }

    /// Cache over already decoded bands
    pub fn from_bands(bands: impl IntoIterator<Item = (BandRole, RasterBand)>) -> Self {
        Self {
            bands: bands
                .into_iter()
                .map(|(role, band)| (role, Ok(Arc::new(band))))
                .collect(),
        }
    }

    /// The band for `role`, or the reason it is unavailable
    pub fn get(&self, role: BandRole) -> Result<Arc<RasterBand>, PipelineError> {
        match self.bands.get(&role) {
            Some(band) => band.clone(),
            None => Err(PipelineError::MissingBand { role }),
        }
    }

    /// Numerator and denominator bands of `kind`
    pub fn pair(&self, kind: IndexKind) -> Result<(Arc<RasterBand>, Arc<RasterBand>), PipelineError> {
        Ok((self.get(kind.numerator())?, self.get(kind.denominator())?))
    }

    pub fn roles(&self) -> impl Iterator<Item = BandRole> + '_ {
        self.bands.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndlayer_cloud::ArchiveEntry;
    use ndlayer_core::io::encode_band;

    fn entry(name: &str, band: &RasterBand) -> ArchiveEntry {
        ArchiveEntry {
            name: name.into(),
            bytes: encode_band(band).unwrap(),
        }
    }

    #[test]
    fn shared_band_is_decoded_once() {
        let nir = RasterBand::new("B5.tif", 2, 2, vec![200u16; 4]);
        let red = RasterBand::new("B4.tif", 2, 2, vec![100u16; 4]);
        let green = RasterBand::new("B3.tif", 2, 2, vec![50u16; 4]);

        let mut extraction = Extraction::default();
        extraction.entries.insert(BandRole::Nir, entry("B5.tif", &nir));
        extraction.entries.insert(BandRole::Red, entry("B4.tif", &red));
        extraction.entries.insert(BandRole::Green, entry("B3.tif", &green));

        let cache = BandCache::decode(&extraction, &[BandRole::Red, BandRole::Green, BandRole::Nir]);
        let (ndvi_nir, _) = cache.pair(IndexKind::Vegetation).unwrap();
        let (_, ndwi_nir) = cache.pair(IndexKind::Water).unwrap();
        assert!(Arc::ptr_eq(&ndvi_nir, &ndwi_nir));
        assert_eq!(ndvi_nir.samples().as_u16(), Some(&[200u16; 4][..]));
    }

    #[test]
    fn missing_and_corrupt_bands() {
        let mut extraction = Extraction::default();
        extraction.entries.insert(
            BandRole::Red,
            ArchiveEntry {
                name: "B4.tif".into(),
                bytes: b"not a tiff".to_vec(),
            },
        );
        let cache = BandCache::decode(&extraction, &[BandRole::Red, BandRole::Nir]);

        assert!(matches!(
            cache.get(BandRole::Red),
            Err(PipelineError::Decode { ref entry, .. }) if entry == "B4.tif"
        ));
        assert_eq!(
            cache.get(BandRole::Nir).unwrap_err(),
            PipelineError::MissingBand { role: BandRole::Nir }
        );
        assert!(cache.get(BandRole::Green).is_err());
    }
}
