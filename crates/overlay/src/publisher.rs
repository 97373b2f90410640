//! Handing finished layers to the map.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use ndlayer_colormap::ImageAsset;
use ndlayer_core::{Extent, CRS};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::session::{MapSession, RunToken};

/// Failure reported by a [`MapLayerSink`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SinkError(pub String);

/// Viewport fit request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitOptions {
    /// Animation length
    pub duration: Duration,
}

impl FitOptions {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

/// A rendered image and where it goes on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoImage {
    pub image: ImageAsset,
    /// Bounds in `display_crs`
    pub extent: Extent,
    pub source_crs: CRS,
    pub display_crs: CRS,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    pub title: String,
    pub geo_image: GeoImage,
    pub visible: bool,
}

/// The map engine as seen by the pipeline.
pub trait MapLayerSink {
    fn add_layer(&mut self, layer: OverlayLayer) -> Result<(), SinkError>;

    fn fit_view(&mut self, extent: Extent, fit: FitOptions) -> Result<(), SinkError>;
}

#[derive(Debug, Default)]
struct Recorded {
    layers: Vec<OverlayLayer>,
    fits: Vec<(Extent, FitOptions)>,
}

/// Sink that records everything it receives. Clones share the record, so a
/// clone kept by the caller observes what the session's copy was given.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<Recorded>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> Vec<OverlayLayer> {
        self.lock().layers.clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.lock().layers.iter().map(|l| l.title.clone()).collect()
    }

    pub fn fits(&self) -> Vec<(Extent, FitOptions)> {
        self.lock().fits.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MapLayerSink for MemorySink {
    fn add_layer(&mut self, layer: OverlayLayer) -> Result<(), SinkError> {
        self.lock().layers.push(layer);
        Ok(())
    }

    fn fit_view(&mut self, extent: Extent, fit: FitOptions) -> Result<(), SinkError> {
        self.lock().fits.push((extent, fit));
        Ok(())
    }
}

/// What happened to a publish request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// A newer run started; the layer was dropped
    Superseded,
}

/// Publishes layers into a [`MapSession`] on behalf of one run.
pub struct OverlayPublisher<'a> {
    session: &'a MapSession,
    token: &'a RunToken,
}

impl<'a> OverlayPublisher<'a> {
    pub fn new(session: &'a MapSession, token: &'a RunToken) -> Self {
        Self { session, token }
    }

    /// Add `geo_image` as a visible layer titled `title`, then fit the view
    /// to its extent. Both calls happen under the session lock, and not at
    /// all if the run has been superseded. Once the layer is on the map the
    /// publish counts; a failed fit is only logged.
    pub fn publish(
        &self,
        geo_image: GeoImage,
        title: &str,
        fit: FitOptions,
    ) -> Result<PublishOutcome, PipelineError> {
        let extent = geo_image.extent;
        let layer = OverlayLayer {
            title: title.to_string(),
            geo_image,
            visible: true,
        };

        let outcome = self.session.with_current_sink(
            self.token,
            |sink| -> Result<Option<SinkError>, SinkError> {
                sink.add_layer(layer)?;
                Ok(sink.fit_view(extent, fit).err())
            },
        );

        match outcome {
            Some(Ok(fit_error)) => {
                if let Some(e) = fit_error {
                    warn!(title, error = %e, "layer added, view fit failed");
                }
                info!(title, ?extent, fit_ms = fit.duration.as_millis() as u64, "published layer");
                Ok(PublishOutcome::Published)
            }
            Some(Err(e)) => Err(e.into()),
            None => {
                debug!(title, "run superseded, layer discarded");
                Ok(PublishOutcome::Superseded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndlayer_colormap::{compose, ColorRaster};

    fn geo_image() -> GeoImage {
        let colors = ColorRaster {
            width: 1,
            height: 1,
            rgba: vec![[0, 128, 0, 255]],
        };
        GeoImage {
            image: compose(&colors).unwrap(),
            extent: Extent::new(0.0, 0.0, 10.0, 10.0),
            source_crs: CRS::utm(18, true),
            display_crs: CRS::web_mercator(),
        }
    }

    struct FailingSink;

    impl MapLayerSink for FailingSink {
        fn add_layer(&mut self, _: OverlayLayer) -> Result<(), SinkError> {
            Err(SinkError("map closed".into()))
        }

        fn fit_view(&mut self, _: Extent, _: FitOptions) -> Result<(), SinkError> {
            Ok(())
        }
    }

    /// Accepts layers but cannot move the view
    #[derive(Clone, Default)]
    struct FixedViewSink {
        layers: MemorySink,
    }

    impl MapLayerSink for FixedViewSink {
        fn add_layer(&mut self, layer: OverlayLayer) -> Result<(), SinkError> {
            self.layers.add_layer(layer)
        }

        fn fit_view(&mut self, _: Extent, _: FitOptions) -> Result<(), SinkError> {
            Err(SinkError("view locked".into()))
        }
    }

    #[test]
    fn publish_adds_layer_then_fits() {
        let sink = MemorySink::new();
        let session = MapSession::new(sink.clone());
        let token = session.begin_run();
        let fit = FitOptions::new(Duration::from_millis(5000));

        let outcome = OverlayPublisher::new(&session, &token)
            .publish(geo_image(), "NDVI Layer", fit)
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Published);

        let layers = sink.layers();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].title, "NDVI Layer");
        assert!(layers[0].visible);
        assert_eq!(sink.fits(), vec![(Extent::new(0.0, 0.0, 10.0, 10.0), fit)]);
    }

    #[test]
    fn stale_token_is_discarded() {
        let sink = MemorySink::new();
        let session = MapSession::new(sink.clone());
        let old = session.begin_run();
        let _new = session.begin_run();

        let outcome = OverlayPublisher::new(&session, &old)
            .publish(geo_image(), "NDWI Layer", FitOptions::new(Duration::ZERO))
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Superseded);
        assert!(sink.layers().is_empty());
        assert!(sink.fits().is_empty());
    }

    #[test]
    fn sink_errors_surface_as_publish_errors() {
        let session = MapSession::new(FailingSink);
        let token = session.begin_run();
        let err = OverlayPublisher::new(&session, &token)
            .publish(geo_image(), "NDVI Layer", FitOptions::new(Duration::ZERO))
            .unwrap_err();
        assert_eq!(err, PipelineError::Publish(SinkError("map closed".into())));
    }

    #[test]
    fn failed_fit_keeps_layer_published() {
        let sink = FixedViewSink::default();
        let session = MapSession::new(sink.clone());
        let token = session.begin_run();

        let outcome = OverlayPublisher::new(&session, &token)
            .publish(geo_image(), "NDWI Layer", FitOptions::new(Duration::ZERO))
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Published);
        assert_eq!(sink.layers.titles(), vec!["NDWI Layer"]);
        assert!(sink.layers.fits().is_empty());
    }
}
