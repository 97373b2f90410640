//! # ndlayer Overlay
//!
//! The band-index overlay pipeline. One run takes a zip archive of
//! single-band GeoTIFFs and, for each enabled [`IndexKind`], produces a
//! classified color image placed on the map:
//!
//! ```text
//! fetch → extract → decode ─┬─ validate → compute → classify → compose → reproject → publish  (NDVI)
//!                           └─ validate → compute → classify → compose → reproject → publish  (NDWI)
//! ```
//!
//! Bands shared between kinds are decoded once into a [`BandCache`]. Kinds
//! run concurrently and fail independently; only fetch and extraction
//! failures abort a whole run.
//!
//! Layers go to a caller-owned [`MapSession`], which wraps a
//! [`MapLayerSink`] and a run generation counter. Starting a new run
//! supersedes older ones: their remaining stages are skipped and their
//! publishes discarded.
//!
//! ## Usage
//!
//! ```ignore
//! use ndlayer_overlay::{MapSession, MemorySink, Pipeline, PipelineConfig};
//!
//! let sink = MemorySink::default();
//! let session = MapSession::new(sink.clone());
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//!
//! let token = session.begin_run();
//! let report = pipeline.run(&archive_bytes, &session, &token)?;
//! assert_eq!(sink.layers().len(), report.published());
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod pipeline;
pub mod publisher;
pub mod session;

pub use cache::BandCache;
pub use config::PipelineConfig;
pub use error::{ErrorKind, PipelineError, Stage, StageFailure};
pub use events::PipelineEvent;
pub use executor::spawn_run;
pub use pipeline::{KindOutcome, Pipeline, RunReport};
pub use publisher::{
    FitOptions, GeoImage, MapLayerSink, MemorySink, OverlayLayer, OverlayPublisher,
    PublishOutcome, SinkError,
};
pub use session::{MapSession, RunToken};

pub use ndlayer_core::IndexKind;
