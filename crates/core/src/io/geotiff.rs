//! Native GeoTIFF decoding/encoding via the `tiff` crate.
//!
//! Reads the first image of the file with its declared sample format, the
//! affine georeferencing (ModelPixelScale + ModelTiepoint, or
//! ModelTransformation) and the EPSG code from the GeoKey directory.

use crate::band::{RasterBand, SampleBuffer};
use crate::crs::{CRS, USER_DEFINED};
use crate::error::{Error, Result};
use crate::raster::GeoTransform;
use std::io::{Cursor, Read, Seek, Write};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;

// GeoKey IDs
const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const RASTER_PIXEL_IS_POINT: u16 = 2;

/// Decode one GeoTIFF held in memory.
///
/// `name` is carried into the band for diagnostics (usually the archive entry
/// name).
pub fn decode_band(name: &str, data: &[u8]) -> Result<RasterBand> {
    decode(name, Cursor::new(data))
}

fn decode<R: Read + Seek>(name: &str, reader: R) -> Result<RasterBand> {
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Decode(format!("{}: {}", name, e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Decode(format!("{}: cannot read dimensions: {}", name, e)))?;

    let samples = match decoder
        .read_image()
        .map_err(|e| Error::Decode(format!("{}: cannot read image data: {}", name, e)))?
    {
        DecodingResult::U8(buf) => SampleBuffer::U8(buf),
        DecodingResult::U16(buf) => SampleBuffer::U16(buf),
        DecodingResult::U32(buf) => SampleBuffer::U32(buf),
        DecodingResult::U64(buf) => SampleBuffer::U64(buf),
        DecodingResult::I8(buf) => SampleBuffer::I8(buf),
        DecodingResult::I16(buf) => SampleBuffer::I16(buf),
        DecodingResult::I32(buf) => SampleBuffer::I32(buf),
        DecodingResult::I64(buf) => SampleBuffer::I64(buf),
        DecodingResult::F32(buf) => SampleBuffer::F32(buf),
        DecodingResult::F64(buf) => SampleBuffer::F64(buf),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(Error::UnsupportedDataType(format!(
                "{}: unsupported TIFF sample encoding",
                name
            )))
        }
    };

    let geokeys = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).ok();
    let mut transform = read_geotransform(&mut decoder).unwrap_or_default();
    if geokeys.as_deref().and_then(parse_raster_type) == Some(RASTER_PIXEL_IS_POINT) {
        transform = transform.center_to_corner();
    }
    let crs = geokeys.as_deref().and_then(parse_geokey_crs);

    Ok(RasterBand::new(name, width as usize, height as usize, samples)
        .with_transform(transform)
        .with_crs(crs))
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok();
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok();
    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        if let Some(gt) = GeoTransform::from_tiepoint_scale(&tiepoint, &scale) {
            return Some(gt);
        }
    }

    let matrix = decoder.get_tag_f64_vec(Tag::ModelTransformationTag).ok()?;
    GeoTransform::from_model_transformation(&matrix)
}

/// Inline `(key_id, value)` pairs of a GeoKeyDirectory.
///
/// Layout: `[version, revision, minor, count, (key_id, location, count, value)*]`.
/// Keys stored elsewhere (location != 0) are skipped.
fn inline_geokeys(keys: &[u16]) -> impl Iterator<Item = (u16, u16)> + '_ {
    let num_keys = keys.get(3).copied().unwrap_or(0) as usize;
    keys.get(4..)
        .unwrap_or_default()
        .chunks_exact(4)
        .take(num_keys)
        .filter(|entry| entry[1] == 0)
        .map(|entry| (entry[0], entry[3]))
}

/// GTRasterTypeGeoKey: 1 for PixelIsArea, 2 for PixelIsPoint.
fn parse_raster_type(keys: &[u16]) -> Option<u16> {
    inline_geokeys(keys).find_map(|(key_id, value)| (key_id == GT_RASTER_TYPE).then_some(value))
}

/// Extract the CRS from a GeoKeyDirectory.
///
/// Only inline SHORT values can hold an EPSG code. A projected system wins
/// over the geographic one, which projected files usually also record for
/// their datum.
pub(crate) fn parse_geokey_crs(keys: &[u16]) -> Option<CRS> {
    let mut projected = None;
    let mut geographic = None;

    for (key_id, value) in inline_geokeys(keys) {
        if value == 0 || u32::from(value) == USER_DEFINED {
            continue;
        }
        match key_id {
            PROJECTED_CS_TYPE => projected = Some(value),
            GEOGRAPHIC_TYPE => geographic = Some(value),
            _ => {}
        }
    }

    projected
        .or(geographic)
        .map(|code| CRS::from_epsg(u32::from(code)))
}

/// Encode a band as a single-image GeoTIFF with georeferencing tags.
///
/// Supports `u8`, `u16`, `f32` and `f64` samples.
pub fn encode_band(band: &RasterBand) -> Result<Vec<u8>> {
    encode(band, RASTER_PIXEL_IS_AREA)
}

fn encode(band: &RasterBand, raster_type: u16) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buf))
            .map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

        let geokeys = geokey_directory(band.crs(), raster_type);
        let enc = &mut encoder;
        match band.samples() {
            SampleBuffer::U8(data) => write_image::<_, colortype::Gray8>(enc, band, &geokeys, data)?,
            SampleBuffer::U16(data) => {
                write_image::<_, colortype::Gray16>(enc, band, &geokeys, data)?
            }
            SampleBuffer::F32(data) => {
                write_image::<_, colortype::Gray32Float>(enc, band, &geokeys, data)?
            }
            SampleBuffer::F64(data) => {
                write_image::<_, colortype::Gray64Float>(enc, band, &geokeys, data)?
            }
            other => {
                return Err(Error::UnsupportedDataType(format!(
                    "cannot encode {} samples",
                    other.sample_type()
                )))
            }
        }
    }
    Ok(buf)
}

fn write_image<W, C>(
    encoder: &mut TiffEncoder<W>,
    band: &RasterBand,
    geokeys: &[u16],
    data: &[C::Inner],
) -> Result<()>
where
    W: Write + Seek,
    C: ColorType,
    [C::Inner]: TiffValue,
{
    let mut image = encoder
        .new_image::<C>(band.width() as u32, band.height() as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

    let gt = band.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &scale[..])
        .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
        .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;

    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, geokeys)
        .map_err(|e| Error::Other(format!("Cannot write geokey tag: {}", e)))?;

    image
        .write_data(data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))
}

fn geokey_directory(crs: Option<&CRS>, raster_type: u16) -> Vec<u16> {
    let mut keys: Vec<[u16; 4]> = Vec::new();
    match crs {
        Some(crs) if crs.is_geographic() => {
            keys.push([GT_MODEL_TYPE, 0, 1, MODEL_TYPE_GEOGRAPHIC]);
            keys.push([GT_RASTER_TYPE, 0, 1, raster_type]);
            keys.push([GEOGRAPHIC_TYPE, 0, 1, crs.epsg() as u16]);
        }
        Some(crs) => {
            keys.push([GT_MODEL_TYPE, 0, 1, MODEL_TYPE_PROJECTED]);
            keys.push([GT_RASTER_TYPE, 0, 1, raster_type]);
            keys.push([PROJECTED_CS_TYPE, 0, 1, crs.epsg() as u16]);
        }
        None => {
            keys.push([GT_MODEL_TYPE, 0, 1, MODEL_TYPE_PROJECTED]);
            keys.push([GT_RASTER_TYPE, 0, 1, raster_type]);
        }
    }

    let mut dir = vec![1, 1, 0, keys.len() as u16];
    dir.extend(keys.into_iter().flatten());
    dir
}
