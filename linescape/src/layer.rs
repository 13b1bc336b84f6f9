//! Visualization layers: which metric to fetch and how to color it.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::composite::{CompositeMode, CompositeRequest};
use crate::fetch::{Aggregation, TileRequest};
use crate::quadtree::TileAddress;

/// One selectable view of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualizationLayer {
    /// Metric identifier understood by the tile server.
    pub kind: &'static str,
    pub label: &'static str,
    pub composite: CompositeMode,
    pub aggregation: Aggregation,
}

impl VisualizationLayer {
    pub const LENGTH: Self = Self {
        kind: "length",
        label: "Line Length",
        composite: CompositeMode::Direct,
        aggregation: Aggregation::Mean,
    };

    pub const INDENT: Self = Self {
        kind: "indent",
        label: "Line Indent",
        composite: CompositeMode::Indent,
        aggregation: Aggregation::Max,
    };

    pub const OFFSET: Self = Self {
        kind: "offset",
        label: "Line Offset",
        composite: CompositeMode::Direct,
        aggregation: Aggregation::Mean,
    };

    pub const FILE_HASH: Self = Self {
        kind: "fileHash",
        label: "File Hash",
        composite: CompositeMode::Hash,
        aggregation: Aggregation::Mode,
    };

    pub const FILE_EXTENSION: Self = Self {
        kind: "fileExtension",
        label: "File Type",
        composite: CompositeMode::Rainbow,
        aggregation: Aggregation::Mode,
    };

    /// Every built-in layer, in menu order.
    pub const ALL: [Self; 5] = [
        Self::LENGTH,
        Self::INDENT,
        Self::OFFSET,
        Self::FILE_HASH,
        Self::FILE_EXTENSION,
    ];

    /// Looks a layer up by its metric identifier.
    pub fn by_kind(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.kind.eq_ignore_ascii_case(kind))
    }

    /// The composite for one tile of `repo` at `commit` in this layer.
    pub fn composite_request(&self, address: TileAddress, repo: &str, commit: &str) -> CompositeRequest {
        let tile = TileRequest::new(address, repo, commit, self.kind, self.aggregation);
        CompositeRequest::new(tile, self.composite)
    }
}

impl Default for VisualizationLayer {
    fn default() -> Self {
        Self::LENGTH
    }
}

impl fmt::Display for VisualizationLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown layer '{0}' (expected length, indent, offset, fileHash or fileExtension)")]
pub struct LayerError(pub String);

impl FromStr for VisualizationLayer {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::by_kind(s.trim()).ok_or_else(|| LayerError(s.to_string()))
    }
}
