//! Image assets handed to the map.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use ndlayer_core::{Error, Result};

use crate::render::ColorRaster;

/// RGBA image with the exact dimensions of the classified raster.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    image: RgbaImage,
}

impl ImageAsset {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// RGBA bytes, row-major
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(
                self.image.as_raw(),
                self.width(),
                self.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| Error::Encode(format!("PNG: {}", e)))?;
        Ok(out)
    }

    /// `data:image/png;base64,...` URL of the PNG encoding
    pub fn to_data_url(&self) -> Result<String> {
        let png = self.to_png()?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }
}

/// Assemble a color raster into an image, top row first, no resampling.
pub fn compose(colors: &ColorRaster) -> Result<ImageAsset> {
    let expected = colors.width * colors.height;
    if colors.rgba.len() != expected {
        return Err(Error::Encode(format!(
            "color raster holds {} pixels, expected {}x{}",
            colors.rgba.len(),
            colors.width,
            colors.height
        )));
    }
    let width = u32::try_from(colors.width)
        .map_err(|_| Error::InvalidDimensions { width: colors.width, height: colors.height })?;
    let height = u32::try_from(colors.height)
        .map_err(|_| Error::InvalidDimensions { width: colors.width, height: colors.height })?;

    let image = RgbaImage::from_raw(width, height, colors.to_bytes()).ok_or(
        Error::InvalidDimensions {
            width: colors.width,
            height: colors.height,
        },
    )?;

    tracing::debug!(width, height, "composed image asset");
    Ok(ImageAsset { image })
}
