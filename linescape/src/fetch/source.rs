//! Network collaborators that produce raw tiles and entity outlines.
//!
//! The traits return boxed futures so the fetch queue can hold an
//! `Arc<dyn TileSource>` and swap in an in-memory source under test.

pub use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::types::{FetchError, OutlineRequest, TilePayload, TileRequest};

/// Produces raw metric tiles.
pub trait TileSource: Send + Sync {
    /// Fetches one tile. Implementations should stop early and return
    /// [`FetchError::Aborted`] once `cancel` fires.
    fn fetch_tile<'a>(
        &'a self,
        request: &'a TileRequest,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<TilePayload, FetchError>>;
}

/// Produces per-file quadtree bitmasks.
pub trait OutlineSource: Send + Sync {
    fn fetch_outline<'a>(
        &'a self,
        request: &'a OutlineRequest,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<u8>, FetchError>>;
}

/// Tile and outline source backed by the repository server's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpTileSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTileSource {
    /// Requests carry no deadline; a slow tile keeps its fetch slot until it
    /// answers or its cancellation token fires.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("linescape/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/api/tile/{kind}/{repo}/{commit}/{lod}/{x}/{y}?agg={agg}`
    pub fn tile_url(&self, request: &TileRequest) -> String {
        format!(
            "{}/api/tile/{}/{}/{}/{}/{}/{}?agg={}",
            self.base_url,
            request.kind,
            request.repo,
            request.commit,
            request.lod,
            request.x,
            request.y,
            request.aggregation
        )
    }

    /// `{base}/api/commit/fileQuadtree/{repo}/{commit}/{hash}`
    pub fn outline_url(&self, request: &OutlineRequest) -> String {
        format!(
            "{}/api/commit/fileQuadtree/{}/{}/{}",
            self.base_url, request.repo, request.commit, request.hash
        )
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        trace!(url = url, "HTTP GET");
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url = url, error = %e, "HTTP request failed");
            FetchError::Http(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Http(format!("Failed to read response: {}", e)))?;
        debug!(url = url, bytes = bytes.len(), "HTTP response received");
        Ok(bytes.to_vec())
    }

    async fn get_cancellable(&self, url: &str, cancel: CancellationToken) -> Result<Vec<u8>, FetchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Aborted),
            result = self.get(url) => result,
        }
    }
}

impl TileSource for HttpTileSource {
    fn fetch_tile<'a>(
        &'a self,
        request: &'a TileRequest,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<TilePayload, FetchError>> {
        Box::pin(async move {
            let url = self.tile_url(request);
            let body = self.get_cancellable(&url, cancel).await?;
            TilePayload::decode(&body, request)
        })
    }
}

impl OutlineSource for HttpTileSource {
    fn fetch_outline<'a>(
        &'a self,
        request: &'a OutlineRequest,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(async move {
            let url = self.outline_url(request);
            self.get_cancellable(&url, cancel).await
        })
    }
}
