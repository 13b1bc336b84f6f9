//! In-memory tile source for unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use super::source::{BoxFuture, TileSource};
use super::types::{FetchError, TileMetadata, TilePayload, TileRequest, TILE_CELLS};
use crate::quadtree::TileAddress;

/// Serves constant-valued tiles. Each fetch waits for one permit from the
/// gate unless the source is open.
pub(crate) struct GatedSource {
    gate: Semaphore,
    open: bool,
    value: i32,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl GatedSource {
    pub fn gated(value: i32) -> Self {
        Self {
            gate: Semaphore::new(0),
            open: false,
            value,
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn open(value: i32) -> Self {
        Self {
            open: true,
            ..Self::gated(value)
        }
    }

    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn fail(&self, request: &TileRequest) {
        self.failing.lock().unwrap().insert(request.cache_key());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl TileSource for GatedSource {
    fn fetch_tile<'a>(
        &'a self,
        request: &'a TileRequest,
        _cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<TilePayload, FetchError>> {
        Box::pin(async move {
            let key = request.cache_key();
            self.calls.lock().unwrap().push(key.clone());
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            let _guard = ActiveGuard(&self.active);

            if !self.open {
                let permit = self.gate.acquire().await.map_err(|_| FetchError::Aborted)?;
                permit.forget();
            }
            if self.failing.lock().unwrap().contains(&key) {
                return Err(FetchError::Status {
                    status: 500,
                    url: key,
                });
            }
            Ok(payload_for(request, self.value))
        })
    }
}

pub(crate) fn payload_for(request: &TileRequest, value: i32) -> TilePayload {
    TilePayload {
        metadata: TileMetadata {
            x: request.x,
            y: request.y,
            lod: request.lod,
        },
        values: vec![value; TILE_CELLS],
    }
}

pub(crate) fn request(x: u32, y: u32) -> TileRequest {
    TileRequest::new(
        TileAddress { lod: 0, x, y },
        "repo",
        "commit",
        "length",
        super::Aggregation::Mean,
    )
}
