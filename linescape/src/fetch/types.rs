//! Request, payload and error types for raw tile fetching.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::BASE_TILE_SIZE;
use crate::quadtree::TileAddress;

/// Number of metric values in one raw tile.
pub const TILE_CELLS: usize = (BASE_TILE_SIZE as usize) * (BASE_TILE_SIZE as usize);

/// How the server folds the cells of a coarse tile into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Aggregation {
    #[default]
    Mean,
    Mode,
    Max,
    Min,
}

impl Aggregation {
    pub const ALL: [Aggregation; 4] = [
        Aggregation::Mean,
        Aggregation::Mode,
        Aggregation::Max,
        Aggregation::Min,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Mean => "mean",
            Aggregation::Mode => "mode",
            Aggregation::Max => "max",
            Aggregation::Min => "min",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown aggregation '{0}' (expected mean, mode, max or min)")]
pub struct AggregationError(pub String);

impl FromStr for Aggregation {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AggregationError(s.to_string()))
    }
}

/// Identifies one raw metric tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileRequest {
    pub x: u32,
    pub y: u32,
    pub lod: u32,
    pub repo: String,
    pub commit: String,
    /// Metric name, e.g. `length`.
    pub kind: String,
    pub aggregation: Aggregation,
}

impl TileRequest {
    pub fn new(
        address: TileAddress,
        repo: impl Into<String>,
        commit: impl Into<String>,
        kind: impl Into<String>,
        aggregation: Aggregation,
    ) -> Self {
        Self {
            x: address.x,
            y: address.y,
            lod: address.lod,
            repo: repo.into(),
            commit: commit.into(),
            kind: kind.into(),
            aggregation,
        }
    }

    pub fn address(&self) -> TileAddress {
        TileAddress {
            lod: self.lod,
            x: self.x,
            y: self.y,
        }
    }

    /// Deterministic cache key covering every identifying field.
    pub fn cache_key(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}/{}/{}",
            self.kind, self.repo, self.commit, self.lod, self.x, self.y, self.aggregation
        )
    }
}

impl fmt::Display for TileRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

/// Identifies the outline bitmask of one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutlineRequest {
    pub repo: String,
    pub commit: String,
    pub hash: String,
}

/// Header object preceding the metric array in a tile response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMetadata {
    pub x: u32,
    pub y: u32,
    pub lod: u32,
}

/// Decoded raw tile: `TILE_CELLS` values in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePayload {
    pub metadata: TileMetadata,
    pub values: Vec<i32>,
}

impl TilePayload {
    /// Parses a response body: a JSON metadata object followed by a JSON
    /// integer array. The body must describe exactly the requested tile.
    pub fn decode(body: &[u8], request: &TileRequest) -> Result<Self, FetchError> {
        let mut de = serde_json::Deserializer::from_slice(body);
        let metadata = TileMetadata::deserialize(&mut de)
            .map_err(|e| FetchError::Malformed(format!("metadata: {}", e)))?;
        let values = Vec::<i32>::deserialize(&mut de)
            .map_err(|e| FetchError::Malformed(format!("values: {}", e)))?;
        de.end()
            .map_err(|e| FetchError::Malformed(format!("trailing data: {}", e)))?;

        let payload = Self { metadata, values };
        payload.validate(request)?;
        Ok(payload)
    }

    /// Checks element count and that the metadata names the requested tile.
    pub fn validate(&self, request: &TileRequest) -> Result<(), FetchError> {
        if self.values.len() != TILE_CELLS {
            return Err(FetchError::Malformed(format!(
                "expected {} values, got {}",
                TILE_CELLS,
                self.values.len()
            )));
        }
        let expected = TileMetadata {
            x: request.x,
            y: request.y,
            lod: request.lod,
        };
        if self.metadata != expected {
            return Err(FetchError::Malformed(format!(
                "response describes tile {:?}, requested {:?}",
                self.metadata, expected
            )));
        }
        Ok(())
    }

    /// Value of cell `(x, y)` inside the tile.
    pub fn value(&self, x: u32, y: u32) -> Option<i32> {
        if x >= BASE_TILE_SIZE || y >= BASE_TILE_SIZE {
            return None;
        }
        self.values
            .get((y * BASE_TILE_SIZE + x) as usize)
            .copied()
    }
}

/// Errors from fetching raw tiles or outlines.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (connection, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Body did not match the expected schema.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Cooperative cancellation; never a genuine failure.
    #[error("fetch aborted")]
    Aborted,
}

impl FetchError {
    pub fn is_abort(&self) -> bool {
        matches!(self, FetchError::Aborted)
    }
}
