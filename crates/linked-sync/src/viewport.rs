//! Debounced viewport persistence.
//!
//! [`ViewportPersister::persist`] schedules a save after a quiet period,
//! replacing any save still waiting. When the timer fires the viewport is
//! compared with the last one saved and the write is skipped if it moved
//! less than 0.1 units or zoomed less than 0.001. A failed save is logged
//! and not retried; the next gesture saves again.
//!
//! The pending save is an explicit task handle: [`ViewportPersister::cleanup`]
//! and `Drop` abort it, so no write can land after teardown.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use linked_core::{MapId, Viewport};

use crate::client::ApiClient;
use crate::error::ApiError;

pub const POSITION_EPSILON: f64 = 0.1;
pub const ZOOM_EPSILON: f64 = 0.001;

/// Destination of viewport saves.
pub trait ViewportSink: Send + Sync + 'static {
    fn write_viewport(
        &self,
        map_id: MapId,
        viewport: Viewport,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl ViewportSink for ApiClient {
    fn write_viewport(
        &self,
        map_id: MapId,
        viewport: Viewport,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        self.save_viewport(map_id, viewport)
    }
}

/// Returns `true` if `next` differs from `saved` enough to be worth a write.
pub fn is_significant(saved: &Viewport, next: &Viewport) -> bool {
    (saved.x - next.x).abs() >= POSITION_EPSILON
        || (saved.y - next.y).abs() >= POSITION_EPSILON
        || (saved.zoom - next.zoom).abs() >= ZOOM_EPSILON
}

#[derive(Default)]
struct PersistState {
    pending: Option<JoinHandle<()>>,
    /// Bumped whenever the pending save is replaced or cancelled.
    generation: u64,
    last_saved: Option<Viewport>,
}

pub struct ViewportPersister<S: ViewportSink> {
    sink: Arc<S>,
    map_id: MapId,
    debounce: Duration,
    state: Arc<Mutex<PersistState>>,
}

impl<S: ViewportSink> ViewportPersister<S> {
    pub fn new(sink: Arc<S>, map_id: MapId, debounce: Duration) -> Self {
        ViewportPersister {
            sink,
            map_id,
            debounce,
            state: Arc::new(Mutex::new(PersistState::default())),
        }
    }

    /// Treats `viewport` as already saved, e.g. the one restored on open.
    pub fn seeded(self, viewport: Viewport) -> Self {
        lock(&self.state).last_saved = Some(viewport);
        self
    }

    pub fn map_id(&self) -> MapId {
        self.map_id
    }

    pub fn last_saved(&self) -> Option<Viewport> {
        lock(&self.state).last_saved
    }

    /// Schedules a save of `viewport`, superseding any save not yet sent.
    pub fn persist(&self, viewport: Viewport) {
        let mut state = lock(&self.state);
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        state.generation += 1;
        let generation = state.generation;

        let sink = Arc::clone(&self.sink);
        let shared = Arc::clone(&self.state);
        let map_id = self.map_id;
        let debounce = self.debounce;

        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            {
                let mut state = lock(&shared);
                if state.generation != generation {
                    return;
                }
                state.pending = None;
                if let Some(saved) = &state.last_saved {
                    if !is_significant(saved, &viewport) {
                        debug!(%map_id, "viewport unchanged, skipping save");
                        return;
                    }
                }
            }

            match sink.write_viewport(map_id, viewport).await {
                Ok(()) => lock(&shared).last_saved = Some(viewport),
                Err(err) => warn!(%map_id, error = %err, "failed to save viewport"),
            }
        }));
    }

    /// Cancels any save still waiting for its quiet period.
    pub fn cleanup(&self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
    }
}

impl<S: ViewportSink> Drop for ViewportPersister<S> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn lock(state: &Mutex<PersistState>) -> MutexGuard<'_, PersistState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
