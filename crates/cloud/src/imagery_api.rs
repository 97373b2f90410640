//! Client for the imagery download service.
//!
//! The service takes a GeoJSON feature collection plus an image collection
//! and date window, picks the least cloudy scene, and answers with a map id,
//! a token and a `geotiff_url` pointing at the band archive.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{CloudError, Result};
use crate::http::HttpClient;
use crate::source::ArchiveSource;

pub const DEFAULT_COLLECTION: &str = "LANDSAT/LC08/C02/T1_L2";
pub const DEFAULT_START_DATE: &str = "2023-01-01";
pub const DEFAULT_END_DATE: &str = "2024-12-31";

/// Request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageryRequest {
    pub geojson: Value,
    pub collection: String,
    pub start_date: String,
    pub end_date: String,
}

impl ImageryRequest {
    /// Request with the default Landsat 8 collection and date window.
    pub fn new(geojson: Value) -> Self {
        Self {
            geojson,
            collection: DEFAULT_COLLECTION.to_string(),
            start_date: DEFAULT_START_DATE.to_string(),
            end_date: DEFAULT_END_DATE.to_string(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_dates(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_date = start.into();
        self.end_date = end.into();
        self
    }

    /// The service only accepts a feature collection object.
    fn check(&self) -> Result<()> {
        match self.geojson.as_object() {
            Some(obj) if obj.contains_key("features") => Ok(()),
            _ => Err(CloudError::Service("invalid GeoJSON format".into())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    url: Option<String>,
    token: Option<String>,
    geotiff_url: Option<String>,
    error: Option<String>,
}

/// Successful service answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageryProduct {
    /// Map id for the service's own tile layer
    pub url: Option<String>,
    pub token: Option<String>,
    /// Location of the band archive
    pub geotiff_url: String,
}

impl ImageryProduct {
    pub fn archive_source(&self) -> ArchiveSource {
        ArchiveSource::parse(&self.geotiff_url)
    }
}

impl TryFrom<RawResponse> for ImageryProduct {
    type Error = CloudError;

    fn try_from(raw: RawResponse) -> Result<Self> {
        if let Some(error) = raw.error {
            return Err(CloudError::Service(error));
        }
        let geotiff_url = raw
            .geotiff_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| CloudError::Service("response has no geotiff_url".into()))?;
        Ok(Self {
            url: raw.url,
            token: raw.token,
            geotiff_url,
        })
    }
}

/// Async client bound to one service endpoint.
#[derive(Debug, Clone)]
pub struct ImageryClient {
    http: HttpClient,
    endpoint: String,
}

impl ImageryClient {
    pub fn new(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// Ask the service for an archive covering `request.geojson`.
    pub async fn request(&self, request: &ImageryRequest) -> Result<ImageryProduct> {
        request.check()?;
        let raw: RawResponse = self.http.post_json(&self.endpoint, request).await?;
        let product = ImageryProduct::try_from(raw)?;
        info!(
            endpoint = %self.endpoint,
            collection = %request.collection,
            geotiff_url = %product.geotiff_url,
            "imagery service returned archive"
        );
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_defaults_serialize() {
        let req = ImageryRequest::new(json!({"type": "FeatureCollection", "features": []}));
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["collection"], "LANDSAT/LC08/C02/T1_L2");
        assert_eq!(body["start_date"], "2023-01-01");
        assert_eq!(body["end_date"], "2024-12-31");
        assert!(body["geojson"]["features"].is_array());
    }

    #[test]
    fn geojson_without_features_is_rejected() {
        assert!(ImageryRequest::new(json!({"type": "Polygon"})).check().is_err());
        assert!(ImageryRequest::new(json!([1, 2])).check().is_err());
    }

    #[test]
    fn response_mapping() {
        let raw: RawResponse = serde_json::from_value(json!({
            "url": "projects/x/maps/abc",
            "token": "t",
            "geotiff_url": "https://host/download.zip"
        }))
        .unwrap();
        let product = ImageryProduct::try_from(raw).unwrap();
        assert_eq!(product.token.as_deref(), Some("t"));
        assert!(product.archive_source().is_remote());

        let raw: RawResponse = serde_json::from_value(json!({"error": "no scenes"})).unwrap();
        assert!(matches!(
            ImageryProduct::try_from(raw),
            Err(CloudError::Service(msg)) if msg == "no scenes"
        ));

        let raw: RawResponse = serde_json::from_value(json!({"url": "m"})).unwrap();
        assert!(ImageryProduct::try_from(raw).is_err());
    }
}
