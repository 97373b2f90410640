//! Map sink that writes layers to a directory.
//!
//! Each layer becomes `<slug>.png` plus a `<slug>.json` descriptor holding
//! its title, extent and CRSs. The latest viewport fit goes to `view.json`.

use std::path::PathBuf;

use ndlayer_core::Extent;
use ndlayer_overlay::{FitOptions, MapLayerSink, OverlayLayer, SinkError};
use serde_json::json;
use tracing::debug;

pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<(), SinkError> {
        let path = self.dir.join(name);
        std::fs::write(&path, bytes)
            .map_err(|e| SinkError(format!("writing {}: {e}", path.display())))?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote");
        Ok(())
    }
}

impl MapLayerSink for DirectorySink {
    fn add_layer(&mut self, layer: OverlayLayer) -> Result<(), SinkError> {
        let slug = slug(&layer.title);
        let image = &layer.geo_image.image;
        let png = image
            .to_png()
            .map_err(|e| SinkError(format!("encoding {}: {e}", layer.title)))?;
        let png_name = format!("{slug}.png");

        let descriptor = json!({
            "title": layer.title,
            "image": png_name,
            "width": image.width(),
            "height": image.height(),
            "extent": layer.geo_image.extent.to_array(),
            "source_crs": layer.geo_image.source_crs.identifier(),
            "display_crs": layer.geo_image.display_crs.identifier(),
            "visible": layer.visible,
        });

        self.write(&png_name, &png)?;
        self.write(&format!("{slug}.json"), &to_pretty(&descriptor)?)
    }

    fn fit_view(&mut self, extent: Extent, fit: FitOptions) -> Result<(), SinkError> {
        let view = json!({
            "extent": extent.to_array(),
            "duration_ms": fit.duration.as_millis() as u64,
        });
        self.write("view.json", &to_pretty(&view)?)
    }
}

fn to_pretty(value: &serde_json::Value) -> Result<Vec<u8>, SinkError> {
    serde_json::to_vec_pretty(value).map_err(|e| SinkError(e.to_string()))
}

/// "NDVI Layer" -> "ndvi_layer"
fn slug(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use ndlayer_colormap::{compose, ColorRaster};
    use ndlayer_core::CRS;
    use ndlayer_overlay::GeoImage;

    fn layer() -> OverlayLayer {
        let colors = ColorRaster {
            width: 2,
            height: 1,
            rgba: vec![[0, 128, 0, 255], [139, 69, 19, 255]],
        };
        OverlayLayer {
            title: "NDVI Layer".into(),
            geo_image: GeoImage {
                image: compose(&colors).unwrap(),
                extent: Extent::new(-8.2e6, 4.9e6, -8.1e6, 5.0e6),
                source_crs: CRS::utm(18, true),
                display_crs: CRS::web_mercator(),
            },
            visible: true,
        }
    }

    #[test]
    fn slugs() {
        assert_eq!(slug("NDVI Layer"), "ndvi_layer");
        assert_eq!(slug("NDWI Layer"), "ndwi_layer");
    }

    #[test]
    fn writes_png_and_descriptor() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out");
        let mut sink = DirectorySink::new(&dir).unwrap();
        sink.add_layer(layer()).unwrap();
        sink.fit_view(
            Extent::new(-8.2e6, 4.9e6, -8.1e6, 5.0e6),
            FitOptions::new(Duration::from_millis(5000)),
        )
        .unwrap();

        let png = std::fs::read(dir.join("ndvi_layer.png")).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let text = std::fs::read_to_string(dir.join("ndvi_layer.json")).unwrap();
        let descriptor: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(descriptor["title"], "NDVI Layer");
        assert_eq!(descriptor["image"], "ndvi_layer.png");
        assert_eq!(descriptor["width"], 2);
        assert_eq!(descriptor["display_crs"], CRS::web_mercator().identifier());
        assert_eq!(descriptor["visible"], true);

        let view: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.join("view.json")).unwrap()).unwrap();
        assert_eq!(view["duration_ms"], 5000);
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 3);
    }
}
