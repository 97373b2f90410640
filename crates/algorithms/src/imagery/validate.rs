//! Band pair validation
//!
//! A pair only reaches index math once both bands decoded, so this module
//! checks what decoding cannot promise: matching grids, a sample count that
//! agrees with the grid, and unsigned 16-bit samples.

use ndlayer_core::{BandRole, Error, IndexKind, RasterBand, Result, SampleType};

/// Two decoded bands assigned to the numerator/denominator roles of an index.
#[derive(Debug, Clone, Copy)]
pub struct BandPair<'a> {
    roles: [BandRole; 2],
    a: &'a RasterBand,
    b: &'a RasterBand,
}

impl<'a> BandPair<'a> {
    /// Pair `a` (positive term) with `b` (negative term)
    pub fn new(roles: [BandRole; 2], a: &'a RasterBand, b: &'a RasterBand) -> Self {
        Self { roles, a, b }
    }

    /// Pair for an index kind: `a` must be the kind's numerator band
    pub fn for_kind(kind: IndexKind, a: &'a RasterBand, b: &'a RasterBand) -> Self {
        Self::new(kind.roles(), a, b)
    }

    pub fn roles(&self) -> [BandRole; 2] {
        self.roles
    }

    pub fn a(&self) -> &'a RasterBand {
        self.a
    }

    pub fn b(&self) -> &'a RasterBand {
        self.b
    }

    /// Both `u16` sample slices. Only meaningful after [`validate`].
    pub(crate) fn u16_samples(&self) -> Result<(&'a [u16], &'a [u16])> {
        Ok((
            expect_u16(self.roles[0], self.a)?,
            expect_u16(self.roles[1], self.b)?,
        ))
    }
}

/// Check a pair, returning it unchanged on success.
///
/// Checks run in order and stop at the first failure:
/// 1. equal width and height ([`Error::SizeMismatch`])
/// 2. `samples.len() == width * height` for each band
///    ([`Error::SampleCountMismatch`])
/// 3. `u16` samples in both bands ([`Error::InvalidSampleType`])
/// 4. same CRS when both bands record one ([`Error::CrsMismatch`])
pub fn validate(pair: BandPair<'_>) -> Result<BandPair<'_>> {
    let (a, b) = (pair.a, pair.b);

    if a.shape() != b.shape() {
        return Err(Error::SizeMismatch {
            er: a.height(),
            ec: a.width(),
            ar: b.height(),
            ac: b.width(),
        });
    }

    for (role, band) in pair.roles.iter().zip([a, b]) {
        let expected = band.width() * band.height();
        let found = band.samples().len();
        if found != expected {
            return Err(Error::SampleCountMismatch {
                band: describe(*role, band),
                width: band.width(),
                height: band.height(),
                expected,
                found,
            });
        }
    }

    for (role, band) in pair.roles.iter().zip([a, b]) {
        expect_u16(*role, band)?;
    }

    if let (Some(ca), Some(cb)) = (a.crs(), b.crs()) {
        if !ca.is_equivalent(cb) {
            return Err(Error::CrsMismatch(ca.identifier(), cb.identifier()));
        }
    }

    Ok(pair)
}

fn expect_u16(role: BandRole, band: &RasterBand) -> Result<&[u16]> {
    band.samples()
        .as_u16()
        .ok_or_else(|| Error::InvalidSampleType {
            band: describe(role, band),
            expected: SampleType::U16.name(),
            found: band.sample_type().name(),
        })
}

fn describe(role: BandRole, band: &RasterBand) -> String {
    format!("{} ({})", role, band.name())
}
