//! Background loading of the hovered file's outline.
//!
//! Only one outline is wanted at a time. Asking for a different file cancels
//! the previous fetch; asking for none clears the current outline.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::source::OutlineSource;
use super::types::{FetchError, OutlineRequest};
use crate::quadtree::{decode_outline, EntityOutline};

enum OutlineState {
    Loading { id: u64, cancel: CancellationToken },
    Ready(Arc<EntityOutline>),
    Failed,
}

/// Keeps the outline of at most one file.
pub struct OutlineLoader {
    source: Arc<dyn OutlineSource>,
    runtime: Handle,
    current: Option<(OutlineRequest, OutlineState)>,
    results_tx: mpsc::UnboundedSender<(u64, Result<EntityOutline, FetchError>)>,
    results_rx: mpsc::UnboundedReceiver<(u64, Result<EntityOutline, FetchError>)>,
    next_id: u64,
}

impl OutlineLoader {
    pub fn new(source: Arc<dyn OutlineSource>, runtime: Handle) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            source,
            runtime,
            current: None,
            results_tx,
            results_rx,
            next_id: 0,
        }
    }

    /// Sets the wanted outline for a grid of side `grid_side`.
    pub fn update(&mut self, wanted: Option<OutlineRequest>, grid_side: u64) {
        self.drain();

        let unchanged = match (&self.current, &wanted) {
            (Some((current, _)), Some(wanted)) => current == wanted,
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        if let Some((_, OutlineState::Loading { cancel, .. })) = &self.current {
            cancel.cancel();
        }
        self.current = wanted.map(|request| {
            let state = self.spawn(request.clone(), grid_side);
            (request, state)
        });
    }

    /// The outline of the wanted file once loaded.
    pub fn get(&self) -> Option<Arc<EntityOutline>> {
        match &self.current {
            Some((_, OutlineState::Ready(outline))) => Some(Arc::clone(outline)),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(&self.current, Some((_, OutlineState::Loading { .. })))
    }

    /// Waits for the outstanding load, if any, and commits it.
    pub async fn settle(&mut self) {
        while self.is_loading() {
            match self.results_rx.recv().await {
                Some((id, result)) => self.commit(id, result),
                None => break,
            }
        }
    }

    fn drain(&mut self) {
        while let Ok((id, result)) = self.results_rx.try_recv() {
            self.commit(id, result);
        }
    }

    fn commit(&mut self, id: u64, result: Result<EntityOutline, FetchError>) {
        let Some((request, state)) = &mut self.current else {
            return;
        };
        if !matches!(state, OutlineState::Loading { id: current, .. } if *current == id) {
            return;
        }
        *state = match result {
            Ok(outline) => {
                debug!(hash = %request.hash, cells = outline.cells.len(), "Outline loaded");
                OutlineState::Ready(Arc::new(outline))
            }
            Err(e) if e.is_abort() => return,
            Err(e) => {
                warn!(hash = %request.hash, error = %e, "Outline fetch failed");
                OutlineState::Failed
            }
        };
    }

    fn spawn(&mut self, request: OutlineRequest, grid_side: u64) -> OutlineState {
        let id = self.next_id;
        self.next_id += 1;
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let source = Arc::clone(&self.source);
        let tx = self.results_tx.clone();

        self.runtime.spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(FetchError::Aborted),
                bytes = source.fetch_outline(&request, token.clone()) => bytes,
            };
            let result = result.and_then(|bytes| {
                decode_outline(&bytes, grid_side).map_err(|e| FetchError::Malformed(e.to_string()))
            });
            let _ = tx.send((id, result));
        });

        OutlineState::Loading { id, cancel }
    }
}

impl Drop for OutlineLoader {
    fn drop(&mut self) {
        if let Some((_, OutlineState::Loading { cancel, .. })) = &self.current {
            cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::source::BoxFuture;
    use std::sync::Mutex;

    struct FixedOutlines {
        calls: Mutex<Vec<String>>,
    }

    impl OutlineSource for FixedOutlines {
        fn fetch_outline<'a>(
            &'a self,
            request: &'a OutlineRequest,
            _cancel: CancellationToken,
        ) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(request.hash.clone());
                match request.hash.as_str() {
                    "whole" => Ok(vec![0x00]),
                    "first" => Ok(vec![0x11]),
                    "truncated" => Ok(vec![0x03]),
                    _ => Err(FetchError::Status {
                        status: 404,
                        url: request.hash.clone(),
                    }),
                }
            })
        }
    }

    fn wanted(hash: &str) -> Option<OutlineRequest> {
        Some(OutlineRequest {
            repo: "r".into(),
            commit: "c".into(),
            hash: hash.into(),
        })
    }

    fn loader() -> (Arc<FixedOutlines>, OutlineLoader) {
        let source = Arc::new(FixedOutlines {
            calls: Mutex::new(Vec::new()),
        });
        let loader = OutlineLoader::new(source.clone(), Handle::current());
        (source, loader)
    }

    #[tokio::test]
    async fn test_loads_and_decodes_outline() {
        let (_, mut loader) = loader();
        loader.update(wanted("first"), 4);
        assert!(loader.get().is_none());
        loader.settle().await;
        let outline = loader.get().unwrap();
        assert_eq!(outline.cells.len(), 1);
        assert_eq!(outline.segments.len(), 4);
    }

    #[tokio::test]
    async fn test_same_request_is_fetched_once() {
        let (source, mut loader) = loader();
        loader.update(wanted("whole"), 4);
        loader.settle().await;
        loader.update(wanted("whole"), 4);
        loader.update(wanted("whole"), 4);
        assert_eq!(source.calls.lock().unwrap().len(), 1);
        assert!(loader.get().is_some());
    }

    #[tokio::test]
    async fn test_switching_cancels_previous() {
        let (source, mut loader) = loader();
        loader.update(wanted("whole"), 4);
        loader.update(wanted("first"), 4);
        loader.settle().await;
        assert_eq!(loader.get().unwrap().cells.len(), 1);
        assert_eq!(*source.calls.lock().unwrap(), vec!["first".to_string()]);
    }

    #[tokio::test]
    async fn test_failures_and_bad_masks_yield_nothing() {
        let (_, mut loader) = loader();
        loader.update(wanted("missing"), 4);
        loader.settle().await;
        assert!(loader.get().is_none());
        assert!(!loader.is_loading());

        loader.update(wanted("truncated"), 4);
        loader.settle().await;
        assert!(loader.get().is_none());
    }

    #[tokio::test]
    async fn test_clearing_drops_outline() {
        let (_, mut loader) = loader();
        loader.update(wanted("whole"), 4);
        loader.settle().await;
        loader.update(None, 4);
        assert!(loader.get().is_none());
    }
}
