//! Blocking (synchronous) wrappers for native callers.
//!
//! Each call builds a single-threaded Tokio runtime so callers that live on
//! plain threads don't need to manage their own async runtime. Do not call
//! these from inside a Tokio runtime.

use std::future::Future;

use crate::error::{CloudError, Result};
use crate::http::HttpClient;
use crate::imagery_api::{ImageryClient, ImageryProduct, ImageryRequest};
use crate::source::{fetch_archive, ArchiveSource};

fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CloudError::Network(e.to_string()))?;
    Ok(rt.block_on(fut))
}

/// Blocking [`fetch_archive`].
pub fn blocking_fetch(source: &ArchiveSource, client: &HttpClient) -> Result<Vec<u8>> {
    block_on(fetch_archive(source, client))?
}

/// Blocking [`ImageryClient::request`].
pub fn blocking_request(client: &ImageryClient, request: &ImageryRequest) -> Result<ImageryProduct> {
    block_on(client.request(request))?
}
