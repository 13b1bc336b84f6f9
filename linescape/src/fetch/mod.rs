//! Raw tile fetching.
//!
//! - `types`: requests, decoded payloads and [`FetchError`]
//! - `source`: the [`TileSource`] / [`OutlineSource`] collaborators and the
//!   HTTP implementation
//! - `queue`: [`TileFetchQueue`], the bounded-concurrency fetch and cache
//! - `outline`: [`OutlineLoader`] for the hovered file's outline

mod outline;
mod queue;
mod source;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use outline::OutlineLoader;
pub use queue::{FetchConfig, FetchStats, TileFetchQueue};
pub use source::{BoxFuture, HttpTileSource, OutlineSource, TileSource};
pub use types::{
    Aggregation, AggregationError, FetchError, OutlineRequest, TileMetadata, TilePayload,
    TileRequest, TILE_CELLS,
};
