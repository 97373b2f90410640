//! Pipeline configuration
//!
//! Every field has a default, so a JSON file only needs the keys it changes:
//!
//! ```json
//! {
//!   "display_epsg": 3857,
//!   "fallback_source_epsg": null,
//!   "kinds": ["ndvi"],
//!   "band_patterns": { "red": ".*_SR_B4\\.TIF$" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use ndlayer_cloud::{reproject, HttpOptions, RolePatterns};
use ndlayer_core::{BandRole, IndexKind, CRS};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::publisher::FitOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Filename regex per band role, matched case-insensitively. Roles left
    /// out use the Landsat 8 default.
    pub band_patterns: BTreeMap<BandRole, String>,
    /// CRS of the map the layers are placed on
    pub display_epsg: u32,
    /// CRS assumed for bands that record none; `None` makes that an error
    pub fallback_source_epsg: Option<u32>,
    /// Index products to compute
    pub kinds: Vec<IndexKind>,
    /// Viewport fit animation per kind, overriding the kind's default
    pub fit_duration_ms: BTreeMap<IndexKind, u64>,
    /// Extra points per extent edge when reprojecting
    pub extent_stops: usize,
    pub http_timeout_secs: u64,
    pub http_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            band_patterns: BTreeMap::new(),
            display_epsg: 3857,
            fallback_source_epsg: Some(32618),
            kinds: IndexKind::ALL.to_vec(),
            fit_duration_ms: BTreeMap::new(),
            extent_stops: 0,
            http_timeout_secs: 60,
            http_retries: 3,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(s: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| PipelineError::Config(format!("parsing config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Reject settings that would only fail later in a run.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.kinds.is_empty() {
            return Err(PipelineError::Config("no index kinds enabled".into()));
        }
        check_epsg("display_epsg", self.display_epsg)?;
        if let Some(code) = self.fallback_source_epsg {
            check_epsg("fallback_source_epsg", code)?;
        }
        if self.http_retries > MAX_HTTP_RETRIES {
            return Err(PipelineError::Config(format!(
                "http_retries {} exceeds {}",
                self.http_retries, MAX_HTTP_RETRIES
            )));
        }
        self.role_patterns()?;
        Ok(())
    }

    pub fn pattern(&self, role: BandRole) -> &str {
        self.band_patterns
            .get(&role)
            .map(String::as_str)
            .unwrap_or_else(|| role.default_pattern())
    }

    /// Compiled patterns for every role the enabled kinds need
    pub fn role_patterns(&self) -> Result<RolePatterns, PipelineError> {
        RolePatterns::new(self.required_roles().into_iter().map(|r| (r, self.pattern(r))))
            .map_err(PipelineError::from)
    }

    /// Union of the enabled kinds' band roles, in role order
    pub fn required_roles(&self) -> Vec<BandRole> {
        let mut roles: Vec<BandRole> = self.kinds.iter().flat_map(|k| k.roles()).collect();
        roles.sort();
        roles.dedup();
        roles
    }

    pub fn display_crs(&self) -> CRS {
        CRS::from_epsg(self.display_epsg)
    }

    pub fn fallback_crs(&self) -> Option<CRS> {
        self.fallback_source_epsg.map(CRS::from_epsg)
    }

    pub fn fit_for(&self, kind: IndexKind) -> FitOptions {
        let ms = self
            .fit_duration_ms
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_fit_duration_ms());
        FitOptions::new(Duration::from_millis(ms))
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            request_timeout: Duration::from_secs(self.http_timeout_secs),
            max_retries: self.http_retries,
        }
    }
}

const MAX_HTTP_RETRIES: u32 = 10;

fn check_epsg(field: &str, code: u32) -> Result<(), PipelineError> {
    if reproject::is_supported(code) {
        Ok(())
    } else {
        Err(PipelineError::Config(format!(
            "{field}: EPSG:{code} is not supported"
        )))
    }
}
