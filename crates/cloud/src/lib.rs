//! # ndlayer Cloud
//!
//! Everything between an archive location and its decoded band entries,
//! plus the coordinate math needed to place results on a web map.
//!
//! - [`source`]: resolve and fetch archives from HTTP(S) or disk
//! - [`imagery_api`]: ask the imagery service for an archive covering a
//!   GeoJSON area
//! - [`archive`]: pick band entries out of a zip archive by filename pattern
//! - [`reproject`]: pure-Rust WGS84 / Web Mercator / UTM extent reprojection
//!
//! Fetching is async (tokio + reqwest); [`sync_api`] wraps it in a
//! current-thread runtime for synchronous callers.

pub mod archive;
pub mod error;
pub mod http;
pub mod imagery_api;
pub mod reproject;
pub mod source;
pub mod sync_api;

pub use archive::{extract, extract_each, ArchiveEntry, Extraction, RolePatterns};
pub use error::{CloudError, Result};
pub use http::{HttpClient, HttpOptions};
pub use imagery_api::{ImageryClient, ImageryProduct, ImageryRequest};
pub use reproject::{project_point, reproject_extent, reproject_extent_densified};
pub use source::{fetch_archive, ArchiveSource};
pub use sync_api::{blocking_fetch, blocking_request};
