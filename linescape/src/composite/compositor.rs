//! Turns raw metric tiles into colored bitmaps.
//!
//! Each wanted [`CompositeRequest`] owns a job:
//!
//! ```text
//! Pending ──(all dependencies resident)──► Processing ──(colorized)──► Done
//!    └──────────── dropped as soon as the request is no longer wanted ───┘
//! ```
//!
//! Dependencies of every job are forwarded to the [`TileFetchQueue`] on each
//! update. Colorization runs on tokio's blocking pool.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tiny_skia::Pixmap;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::mode::CompositeMode;
use crate::coord::BASE_TILE_SIZE;
use crate::fetch::{FetchStats, TileFetchQueue, TilePayload, TileRequest};

/// A colorized view of raw tiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeRequest {
    pub tile: TileRequest,
    pub mode: CompositeMode,
}

impl CompositeRequest {
    pub fn new(tile: TileRequest, mode: CompositeMode) -> Self {
        Self { tile, mode }
    }

    pub fn key(&self) -> String {
        format!("{}#{}", self.tile.cache_key(), self.mode)
    }

    /// Raw tiles this composite is computed from.
    pub fn dependencies(&self) -> Vec<TileRequest> {
        vec![self.tile.clone()]
    }
}

#[derive(Debug, Clone)]
enum JobState {
    Pending,
    Processing,
    Done(Arc<Pixmap>),
}

#[derive(Debug)]
struct CompositorJob {
    id: u64,
    request: CompositeRequest,
    dependencies: Vec<TileRequest>,
    state: JobState,
}

struct Finished {
    key: String,
    id: u64,
    bitmap: Option<Pixmap>,
}

/// Job counts for debug overlays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositorStats {
    pub pending: usize,
    pub processing: usize,
    pub done: usize,
    pub fetch: FetchStats,
}

impl fmt::Display for CompositorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "jobs pending {} processing {} done {}",
            self.pending, self.processing, self.done
        )
    }
}

/// Maintains one job per wanted composite.
pub struct TileCompositor {
    fetch: TileFetchQueue,
    runtime: Handle,
    jobs: HashMap<String, CompositorJob>,
    finished_tx: mpsc::UnboundedSender<Finished>,
    finished_rx: mpsc::UnboundedReceiver<Finished>,
    next_id: u64,
}

impl TileCompositor {
    pub fn new(fetch: TileFetchQueue, runtime: Handle) -> Self {
        let (finished_tx, finished_rx) = mpsc::unbounded_channel();
        Self {
            fetch,
            runtime,
            jobs: HashMap::new(),
            finished_tx,
            finished_rx,
            next_id: 0,
        }
    }

    pub fn fetch(&self) -> &TileFetchQueue {
        &self.fetch
    }

    /// Declares every composite wanted this frame.
    pub fn update(&mut self, requests: &[CompositeRequest]) {
        self.drain_finished();

        let wanted: HashSet<String> = requests.iter().map(CompositeRequest::key).collect();
        self.jobs.retain(|key, job| {
            let keep = wanted.contains(key);
            if !keep {
                trace!(key = %key, state = job.state.name(), "Dropping unwanted composite job");
            }
            keep
        });

        let mut dependencies = Vec::new();
        for request in requests {
            let key = request.key();
            let job = self.jobs.entry(key).or_insert_with(|| {
                let id = self.next_id;
                self.next_id += 1;
                CompositorJob {
                    id,
                    request: request.clone(),
                    dependencies: request.dependencies(),
                    state: JobState::Pending,
                }
            });
            dependencies.extend(job.dependencies.iter().cloned());
        }

        self.fetch.update(&dependencies);
        self.promote();
    }

    /// Commits finished work without changing what is wanted.
    pub fn poll(&mut self) {
        self.drain_finished();
        self.fetch.poll();
        self.promote();
    }

    /// Waits for the next fetch or colorization to finish. Returns `false`
    /// when nothing is outstanding.
    pub async fn next_event(&mut self) -> bool {
        let fetching = self.fetch.in_flight_count() > 0;
        let processing = self.count(|s| matches!(s, JobState::Processing)) > 0;

        let progressed = match (fetching, processing) {
            (false, false) => false,
            (true, false) => self.fetch.next_completion().await,
            (false, true) => self.recv_finished().await,
            (true, true) => {
                tokio::select! {
                    done = self.fetch.next_completion() => done,
                    finished = self.finished_rx.recv() => match finished {
                        Some(finished) => {
                            self.commit(finished);
                            true
                        }
                        None => false,
                    },
                }
            }
        };
        self.promote();
        progressed
    }

    /// The finished bitmap, if the job is done.
    pub fn get(&self, request: &CompositeRequest) -> Option<Arc<Pixmap>> {
        match &self.jobs.get(&request.key())?.state {
            JobState::Done(bitmap) => Some(Arc::clone(bitmap)),
            _ => None,
        }
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// True when every wanted composite is done.
    pub fn is_complete(&self) -> bool {
        self.jobs.values().all(|j| matches!(j.state, JobState::Done(_)))
    }

    pub fn stats(&self) -> CompositorStats {
        CompositorStats {
            pending: self.count(|s| matches!(s, JobState::Pending)),
            processing: self.count(|s| matches!(s, JobState::Processing)),
            done: self.count(|s| matches!(s, JobState::Done(_))),
            fetch: self.fetch.stats(),
        }
    }

    fn count(&self, pred: impl Fn(&JobState) -> bool) -> usize {
        self.jobs.values().filter(|j| pred(&j.state)).count()
    }

    async fn recv_finished(&mut self) -> bool {
        match self.finished_rx.recv().await {
            Some(finished) => {
                self.commit(finished);
                true
            }
            None => false,
        }
    }

    fn drain_finished(&mut self) {
        while let Ok(finished) = self.finished_rx.try_recv() {
            self.commit(finished);
        }
    }

    fn commit(&mut self, finished: Finished) {
        let Some(job) = self.jobs.get_mut(&finished.key) else {
            return;
        };
        if job.id != finished.id || !matches!(job.state, JobState::Processing) {
            return;
        }
        match finished.bitmap {
            Some(bitmap) => {
                debug!(key = %finished.key, "Composite ready");
                job.state = JobState::Done(Arc::new(bitmap));
            }
            None => {
                warn!(key = %finished.key, "Failed to allocate composite bitmap");
                self.jobs.remove(&finished.key);
            }
        }
    }

    /// Starts colorization for pending jobs whose inputs are all resident.
    fn promote(&mut self) {
        for (key, job) in self.jobs.iter_mut() {
            if !matches!(job.state, JobState::Pending) {
                continue;
            }
            let inputs: Option<Vec<Arc<TilePayload>>> =
                job.dependencies.iter().map(|d| self.fetch.get(d)).collect();
            let Some(inputs) = inputs else {
                continue;
            };

            job.state = JobState::Processing;
            let mode = job.request.mode;
            let id = job.id;
            let key = key.clone();
            let tx = self.finished_tx.clone();
            self.runtime.spawn_blocking(move || {
                let bitmap = inputs.first().and_then(|payload| colorize(&payload.values, mode));
                let _ = tx.send(Finished { key, id, bitmap });
            });
        }
    }
}

impl JobState {
    fn name(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Processing => "processing",
            JobState::Done(_) => "done",
        }
    }
}

impl fmt::Debug for TileCompositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileCompositor")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Renders a row-major metric tile into a `BASE_TILE_SIZE` square bitmap,
/// one pixel per cell. Returns `None` only if the bitmap cannot be allocated.
pub fn colorize(values: &[i32], mode: CompositeMode) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(BASE_TILE_SIZE, BASE_TILE_SIZE)?;
    // Every color is opaque, so premultiplied and straight RGBA coincide.
    for (pixel, &value) in pixmap.data_mut().chunks_exact_mut(4).zip(values) {
        pixel.copy_from_slice(&mode.color(value));
    }
    Some(pixmap)
}
