//! Caller-owned map session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::publisher::MapLayerSink;

/// Identifies one pipeline run within a [`MapSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunToken {
    generation: u64,
}

impl RunToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The map a pipeline publishes into, plus the current run generation.
///
/// Only the run holding the latest token may publish. Publishes are
/// serialised by the sink mutex, so one layer's `add_layer` and `fit_view`
/// never interleave with another's.
pub struct MapSession {
    sink: Mutex<Box<dyn MapLayerSink + Send>>,
    generation: AtomicU64,
}

impl MapSession {
    pub fn new(sink: impl MapLayerSink + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
            generation: AtomicU64::new(0),
        }
    }

    /// Start a run, superseding every earlier one.
    pub fn begin_run(&self) -> RunToken {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        RunToken { generation }
    }

    pub fn is_current(&self, token: &RunToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.generation
    }

    /// Run `f` on the sink if `token` is still current, checked under the
    /// sink lock. `None` means the run was superseded.
    pub fn with_current_sink<R>(
        &self,
        token: &RunToken,
        f: impl FnOnce(&mut dyn MapLayerSink) -> R,
    ) -> Option<R> {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(token) {
            return None;
        }
        Some(f(&mut **sink))
    }
}

impl std::fmt::Debug for MapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSession")
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
