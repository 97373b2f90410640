//! Run orchestration.

use std::time::Instant;

use crossbeam_channel::Sender;
use ndlayer_algorithms::imagery::{compute_index, validate, BandPair};
use ndlayer_cloud::{blocking_fetch, extract_each, reproject_extent_densified};
use ndlayer_cloud::{ArchiveSource, HttpClient, RolePatterns};
use ndlayer_colormap::{classify, compose};
use ndlayer_core::{Extent, IndexKind, Raster, RasterBand, CRS};
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::cache::BandCache;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Stage, StageFailure};
use crate::events::{Events, PipelineEvent};
use crate::publisher::{GeoImage, OverlayPublisher, PublishOutcome};
use crate::session::{MapSession, RunToken};

/// How one index kind ended
#[derive(Debug, Clone, PartialEq)]
pub enum KindOutcome {
    Published,
    Superseded,
    Failed(StageFailure),
}

/// Per-kind outcomes of a run, in configured kind order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub outcomes: Vec<(IndexKind, KindOutcome)>,
}

impl RunReport {
    pub fn outcome(&self, kind: IndexKind) -> Option<&KindOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }

    pub fn published(&self) -> usize {
        self.count(|o| matches!(o, KindOutcome::Published))
    }

    pub fn superseded(&self) -> usize {
        self.count(|o| matches!(o, KindOutcome::Superseded))
    }

    pub fn failures(&self) -> impl Iterator<Item = &StageFailure> {
        self.outcomes.iter().filter_map(|(_, o)| match o {
            KindOutcome::Failed(f) => Some(f),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&KindOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

enum Abort {
    Superseded,
    Failed(StageFailure),
}

/// The band-index overlay pipeline, configured once and reusable across runs.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    patterns: RolePatterns,
    events: Events,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let patterns = config.role_patterns()?;
        Ok(Self {
            config,
            patterns,
            events: Events::default(),
        })
    }

    /// Report progress on `tx`
    pub fn with_events(mut self, tx: Sender<PipelineEvent>) -> Self {
        self.events = Events::new(tx);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Download or read the archive. Blocks the calling thread.
    pub fn fetch(&self, source: &ArchiveSource) -> Result<Vec<u8>, StageFailure> {
        let start = Instant::now();
        let result = HttpClient::new(self.config.http_options())
            .and_then(|client| blocking_fetch(source, &client))
            .map_err(PipelineError::from);
        self.run_wide(Stage::Fetch, start, result)
    }

    /// Pick the band entries out of `archive` and decode each needed role once.
    ///
    /// Only an unreadable archive fails here; missing or undecodable bands
    /// are recorded in the cache and fail the kinds that need them.
    pub fn load(&self, archive: &[u8]) -> Result<BandCache, StageFailure> {
        let start = Instant::now();
        let extraction = extract_each(archive, &self.patterns).map_err(PipelineError::from);
        let extraction = self.run_wide(Stage::Extract, start, extraction)?;

        let start = Instant::now();
        let cache = BandCache::decode(&extraction, &self.config.required_roles());
        self.run_wide(Stage::Decode, start, Ok(cache))
    }

    /// Full run over archive bytes.
    pub fn run(
        &self,
        archive: &[u8],
        session: &MapSession,
        token: &RunToken,
    ) -> Result<RunReport, StageFailure> {
        if !session.is_current(token) {
            return Ok(self.all_superseded());
        }
        let cache = self.load(archive)?;
        Ok(self.run_with_cache(&cache, session, token))
    }

    /// Run every enabled kind over an already loaded cache, concurrently.
    pub fn run_with_cache(
        &self,
        cache: &BandCache,
        session: &MapSession,
        token: &RunToken,
    ) -> RunReport {
        let outcomes: Vec<(IndexKind, KindOutcome)> = self
            .config
            .kinds
            .par_iter()
            .map(|&kind| (kind, self.run_kind(kind, cache, session, token)))
            .collect();
        let report = RunReport { outcomes };

        let failed = report.failures().count();
        info!(
            published = report.published(),
            superseded = report.superseded(),
            failed,
            "run finished"
        );
        self.events.emit(PipelineEvent::RunFinished {
            published: report.published(),
            failed,
        });
        report
    }

    /// One kind's sub-pipeline, validate through publish.
    pub fn run_kind(
        &self,
        kind: IndexKind,
        cache: &BandCache,
        session: &MapSession,
        token: &RunToken,
    ) -> KindOutcome {
        let outcome = self
            .render(kind, cache, session, token)
            .and_then(|geo_image| self.publish(kind, geo_image, session, token));

        match outcome {
            Ok(PublishOutcome::Published) => {
                self.events.emit(PipelineEvent::Published {
                    kind,
                    title: kind.layer_title().to_string(),
                });
                KindOutcome::Published
            }
            Ok(PublishOutcome::Superseded) | Err(Abort::Superseded) => {
                debug!(%kind, "superseded by a newer run");
                self.events.emit(PipelineEvent::Superseded { kind });
                KindOutcome::Superseded
            }
            Err(Abort::Failed(failure)) => KindOutcome::Failed(failure),
        }
    }

    fn render(
        &self,
        kind: IndexKind,
        cache: &BandCache,
        session: &MapSession,
        token: &RunToken,
    ) -> Result<GeoImage, Abort> {
        let live = || session.is_current(token);
        let k = Some(kind);

        let bands = cache.pair(kind);
        // An unmatched band never reached the decoder.
        let stage = match &bands {
            Err(PipelineError::MissingBand { .. }) => Stage::Extract,
            _ => Stage::Decode,
        };
        let (a, b) = self.stage(k, stage, live(), || bands)?;
        let pair = self.stage(k, Stage::Validate, live(), || {
            Ok(validate(BandPair::for_kind(kind, &a, &b))?)
        })?;
        let index = self.stage(k, Stage::Compute, live(), || Ok(compute_index(kind, pair)?))?;
        let stats = index.statistics();
        debug!(
            %kind,
            min = ?stats.min,
            max = ?stats.max,
            mean = ?stats.mean,
            undefined = stats.nodata_count,
            "index values"
        );
        let colors = self.stage(k, Stage::Classify, live(), || Ok(classify(&index, kind)))?;
        let image = self.stage(k, Stage::Compose, live(), || {
            compose(&colors).map_err(|e| PipelineError::Compose(e.to_string()))
        })?;
        let (extent, source_crs) = self.stage(k, Stage::Reproject, live(), || {
            self.display_extent(kind, &index, &b)
        })?;

        Ok(GeoImage {
            image,
            extent,
            source_crs,
            display_crs: self.config.display_crs(),
        })
    }

    fn publish(
        &self,
        kind: IndexKind,
        geo_image: GeoImage,
        session: &MapSession,
        token: &RunToken,
    ) -> Result<PublishOutcome, Abort> {
        let publisher = OverlayPublisher::new(session, token);
        let fit = self.config.fit_for(kind);
        self.stage(Some(kind), Stage::Publish, session.is_current(token), || {
            publisher.publish(geo_image, kind.layer_title(), fit)
        })
    }

    /// Extent of `index` in the display CRS, plus the source CRS used.
    fn display_extent(
        &self,
        kind: IndexKind,
        index: &Raster<f64>,
        other: &RasterBand,
    ) -> Result<(Extent, CRS), PipelineError> {
        let source = match index.crs().or(other.crs()) {
            Some(crs) => crs.clone(),
            None => match self.config.fallback_crs() {
                Some(fallback) => {
                    warn!(%kind, %fallback, "bands record no CRS, assuming fallback");
                    fallback
                }
                None => {
                    return Err(PipelineError::Reprojection(
                        "bands record no CRS and no fallback is configured".into(),
                    ))
                }
            },
        };

        let display_crs = self.config.display_crs();
        let extent = reproject_extent_densified(
            &index.extent(),
            &source,
            &display_crs,
            self.config.extent_stops,
        )?;
        debug!(%kind, %source, display = %display_crs, ?extent, "reprojected extent");
        Ok((extent, source))
    }

    /// Run one per-kind stage unless the run is no longer live.
    fn stage<T>(
        &self,
        kind: Option<IndexKind>,
        stage: Stage,
        live: bool,
        f: impl FnOnce() -> Result<T, PipelineError>,
    ) -> Result<T, Abort> {
        if !live {
            return Err(Abort::Superseded);
        }
        let start = Instant::now();
        let result = f();
        self.finish(kind, stage, start, result).map_err(Abort::Failed)
    }

    fn run_wide<T>(
        &self,
        stage: Stage,
        start: Instant,
        result: Result<T, PipelineError>,
    ) -> Result<T, StageFailure> {
        self.finish(None, stage, start, result)
    }

    fn finish<T>(
        &self,
        kind: Option<IndexKind>,
        stage: Stage,
        start: Instant,
        result: Result<T, PipelineError>,
    ) -> Result<T, StageFailure> {
        match result {
            Ok(value) => {
                let elapsed = start.elapsed();
                debug!(
                    kind = ?kind,
                    %stage,
                    elapsed_ms = elapsed.as_secs_f64() * 1e3,
                    "stage finished"
                );
                self.events.emit(PipelineEvent::StageFinished { kind, stage, elapsed });
                Ok(value)
            }
            Err(e) => {
                let failure = StageFailure::new(kind, stage, e);
                error!(error_kind = ?failure.error_kind(), "{}", failure);
                self.events.emit((&failure).into());
                Err(failure)
            }
        }
    }

    fn all_superseded(&self) -> RunReport {
        RunReport {
            outcomes: self
                .config
                .kinds
                .iter()
                .map(|&kind| (kind, KindOutcome::Superseded))
                .collect(),
        }
    }
}
