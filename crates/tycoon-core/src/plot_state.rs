//! Plot state store: definitions plus the per-plot write-back cache.
//!
//! Mutations follow read-modify-write on a cloned record; `write` replaces
//! the cached record wholesale. Validation against stale reads is the
//! caller's job (handlers re-check against the cached record they are about
//! to replace, under the engine's single-threaded command loop).

use crate::migrate::plot_state_key;
use crate::store::{KvBackend, WriteBackCache};
use crate::types::{PlotDefinition, PlotId, PlotState};

pub struct PlotStateStore {
    definitions: Vec<PlotDefinition>,
    cache: WriteBackCache<PlotState>,
}

impl PlotStateStore {
    pub fn new(definitions: Vec<PlotDefinition>) -> Self {
        Self {
            definitions,
            cache: WriteBackCache::new(),
        }
    }

    pub fn definitions(&self) -> &[PlotDefinition] {
        &self.definitions
    }

    pub fn definition(&self, plot_id: PlotId) -> Option<&PlotDefinition> {
        self.definitions.iter().find(|d| d.plot_id == plot_id)
    }

    /// Cached state, if this plot has been touched.
    pub fn get(&self, plot_id: PlotId) -> Option<&PlotState> {
        self.cache.get(&plot_state_key(plot_id))
    }

    /// State for `plot_id`, loading from the backend on first touch.
    pub fn ensure<B: KvBackend>(&mut self, backend: &B, plot_id: PlotId, now: u64) -> &PlotState {
        self.cache
            .ensure_with(backend, &plot_state_key(plot_id), now, || {
                PlotState::new(None, now)
            })
    }

    /// Replace the cached state and schedule a flush.
    pub fn write(&mut self, plot_id: PlotId, state: PlotState, now: u64) {
        self.cache.write(&plot_state_key(plot_id), state, now);
    }

    pub fn is_owner(&self, plot_id: PlotId, player_id: &str) -> bool {
        self.get(plot_id)
            .and_then(|s| s.owner_id.as_deref())
            .map(|owner| owner == player_id)
            .unwrap_or(false)
    }

    pub fn flush_due<B: KvBackend>(&mut self, backend: &mut B, now: u64) {
        self.cache.flush_due(backend, now);
    }

    pub fn flush_all<B: KvBackend>(&mut self, backend: &mut B, now: u64) {
        self.cache.flush_all(backend, now);
    }

    pub fn dirty_count(&self) -> usize {
        self.cache.dirty_count()
    }
}
