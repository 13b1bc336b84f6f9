//! Bounded-concurrency fetch queue for raw tiles.
//!
//! The queue is driven from a single owner, once per frame, through
//! [`TileFetchQueue::update`]. Fetches run as tasks on a tokio runtime and
//! report back over a channel; results are committed on the owner's thread
//! the next time the queue is polled, and only if the tile is still wanted.
//!
//! ```text
//! required ──► pending (FIFO, frame order) ──► in flight (≤ K) ──► cache
//!                  ▲                               │ abort when unneeded
//!                  └──── evicted and still required ◄──┘
//! ```
//!
//! A genuine failure starts a cooldown during which no new fetch is started.
//! Aborted fetches neither populate the cache nor count as failures.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::source::TileSource;
use super::types::{FetchError, TilePayload, TileRequest};

/// Fetch queue tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchConfig {
    /// Maximum fetches in flight at once.
    pub max_concurrent: usize,
    /// Pause after a genuine failure during which no fetch is started.
    pub failure_cooldown: Duration,
    /// Number of decoded tiles kept resident between frames.
    pub cache_capacity: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 6,
            failure_cooldown: Duration::from_secs(10),
            cache_capacity: 1024,
        }
    }
}

/// Snapshot of queue counters for debug overlays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub pending: usize,
    pub in_flight: usize,
    pub pinned: usize,
    pub resident: u64,
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
    pub aborted: u64,
    pub cooling_down: bool,
}

impl fmt::Display for FetchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pending {} in flight {} pinned {} resident {} done {} failed {} aborted {}{}",
            self.pending,
            self.in_flight,
            self.pinned,
            self.resident,
            self.completed,
            self.failed,
            self.aborted,
            if self.cooling_down { " (cooldown)" } else { "" }
        )
    }
}

struct InFlight {
    fetch_id: u64,
    cancel: CancellationToken,
}

struct Completion {
    key: String,
    fetch_id: u64,
    result: Result<TilePayload, FetchError>,
}

/// Fetches, caches and cancels raw tiles on behalf of the compositor.
pub struct TileFetchQueue {
    source: Arc<dyn TileSource>,
    runtime: Handle,
    config: FetchConfig,
    cache: Cache<String, Arc<TilePayload>>,
    /// Resident tiles required by the current cycle, held strongly.
    pinned: HashMap<String, Arc<TilePayload>>,
    pending: VecDeque<TileRequest>,
    in_flight: HashMap<String, InFlight>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    next_fetch_id: u64,
    cooldown_until: Option<Instant>,
    started: u64,
    completed: u64,
    failed: u64,
    aborted: u64,
}

impl TileFetchQueue {
    /// Creates a queue spawning fetches on `runtime`.
    pub fn new(source: Arc<dyn TileSource>, config: FetchConfig, runtime: Handle) -> Self {
        let cache = Cache::builder().max_capacity(config.cache_capacity).build();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            source,
            runtime,
            config,
            cache,
            pinned: HashMap::new(),
            pending: VecDeque::new(),
            in_flight: HashMap::new(),
            completions_tx,
            completions_rx,
            next_fetch_id: 0,
            cooldown_until: None,
            started: 0,
            completed: 0,
            failed: 0,
            aborted: 0,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Declares the complete set of tiles needed right now, in priority order.
    ///
    /// Idempotent: repeating the same set only drains finished fetches and
    /// fills free slots.
    pub fn update(&mut self, required: &[TileRequest]) {
        self.drain_completions();

        let mut seen = HashSet::with_capacity(required.len());
        let required: Vec<(String, &TileRequest)> = required
            .iter()
            .map(|r| (r.cache_key(), r))
            .filter(|(key, _)| seen.insert(key.clone()))
            .collect();

        // Abort work nobody wants any more; its slot frees immediately.
        let mut aborted = 0;
        self.in_flight.retain(|key, fetch| {
            if seen.contains(key) {
                return true;
            }
            trace!(key = %key, "Aborting unneeded fetch");
            fetch.cancel.cancel();
            aborted += 1;
            false
        });
        self.aborted += aborted;

        self.pinned.clear();
        self.pending.clear();
        for (key, request) in &required {
            if let Some(payload) = self.cache.get(key) {
                self.pinned.insert(key.clone(), payload);
            } else if !self.in_flight.contains_key(key) {
                self.pending.push_back((*request).clone());
            }
        }

        self.launch();
    }

    /// Commits finished fetches and fills free slots without changing the
    /// required set.
    pub fn poll(&mut self) {
        self.drain_completions();
        self.launch();
    }

    /// Waits until an in-flight fetch reports back and commits it. Returns
    /// `false` immediately when nothing is in flight.
    pub async fn next_completion(&mut self) -> bool {
        if self.in_flight.is_empty() {
            return false;
        }
        match self.completions_rx.recv().await {
            Some(completion) => {
                self.commit(completion);
                self.launch();
                true
            }
            None => false,
        }
    }

    /// The decoded tile, if resident. Absence is normal while loading.
    pub fn get(&self, request: &TileRequest) -> Option<Arc<TilePayload>> {
        self.get_by_key(&request.cache_key())
    }

    pub fn get_by_key(&self, key: &str) -> Option<Arc<TilePayload>> {
        self.pinned
            .get(key)
            .cloned()
            .or_else(|| self.cache.get(key))
    }

    pub fn contains(&self, request: &TileRequest) -> bool {
        let key = request.cache_key();
        self.pinned.contains_key(&key) || self.cache.contains_key(&key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// True while new fetches are suppressed after a failure.
    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_until
            .is_some_and(|until| Instant::now() < until)
    }

    pub fn stats(&self) -> FetchStats {
        FetchStats {
            pending: self.pending.len(),
            in_flight: self.in_flight.len(),
            pinned: self.pinned.len(),
            resident: self.cache.entry_count(),
            started: self.started,
            completed: self.completed,
            failed: self.failed,
            aborted: self.aborted,
            cooling_down: self.is_cooling_down(),
        }
    }

    /// Applies pending cache evictions now instead of on moka's schedule.
    #[cfg(test)]
    fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }

    fn drain_completions(&mut self) {
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.commit(completion);
        }
    }

    fn commit(&mut self, completion: Completion) {
        let Completion {
            key,
            fetch_id,
            result,
        } = completion;

        let current = self
            .in_flight
            .get(&key)
            .is_some_and(|fetch| fetch.fetch_id == fetch_id);
        if !current {
            trace!(key = %key, "Discarding result of superseded fetch");
            return;
        }
        self.in_flight.remove(&key);

        match result {
            Ok(payload) => {
                self.completed += 1;
                let payload = Arc::new(payload);
                self.pinned.insert(key.clone(), Arc::clone(&payload));
                self.cache.insert(key, payload);
            }
            Err(e) if e.is_abort() => {
                debug!(key = %key, "Fetch aborted");
            }
            Err(e) => {
                self.failed += 1;
                let cooldown = self.config.failure_cooldown;
                warn!(
                    key = %key,
                    error = %e,
                    cooldown_secs = cooldown.as_secs_f64(),
                    "Tile fetch failed, pausing new fetches"
                );
                self.cooldown_until = Some(Instant::now() + cooldown);
            }
        }
    }

    fn launch(&mut self) {
        if let Some(until) = self.cooldown_until {
            if Instant::now() < until {
                return;
            }
            info!("Fetch cooldown elapsed, resuming");
            self.cooldown_until = None;
        }

        while self.in_flight.len() < self.config.max_concurrent {
            let Some(request) = self.pending.pop_front() else {
                break;
            };
            self.spawn(request);
        }
    }

    fn spawn(&mut self, request: TileRequest) {
        let key = request.cache_key();
        let fetch_id = self.next_fetch_id;
        self.next_fetch_id += 1;
        self.started += 1;

        let cancel = CancellationToken::new();
        self.in_flight.insert(
            key.clone(),
            InFlight {
                fetch_id,
                cancel: cancel.clone(),
            },
        );
        debug!(key = %key, in_flight = self.in_flight.len(), "Fetching tile");

        let source = Arc::clone(&self.source);
        let tx = self.completions_tx.clone();
        self.runtime.spawn(async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(FetchError::Aborted),
                result = source.fetch_tile(&request, cancel.clone()) => result,
            };
            // The receiver is gone once the queue is dropped.
            let _ = tx.send(Completion {
                key,
                fetch_id,
                result,
            });
        });
    }
}

impl Drop for TileFetchQueue {
    fn drop(&mut self) {
        for fetch in self.in_flight.values() {
            fetch.cancel.cancel();
        }
    }
}

impl fmt::Debug for TileFetchQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileFetchQueue")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}
