//! Progress reporting and cancellation for pipeline runs.
//!
//! Progress is emitted from rayon worker threads, so implementations must be
//! `Send + Sync`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Pipeline phases, ordered by execution sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    /// Clustering, segmenting and building tracks, one item per vessel
    BuildingTracks,
    /// Port proximity tests, one item per track
    FilteringPorts,
}

impl PipelinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePhase::BuildingTracks => "building_tracks",
            PipelinePhase::FilteringPorts => "filtering_ports",
        }
    }
}

/// Receives progress updates and may request cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called when entering a new phase. `total` is the number of items in it.
    fn on_phase(&self, phase: PipelinePhase, total: usize);
    /// Called after completing one item in the current phase.
    fn on_progress(&self);
    /// Polled before each item; returning true abandons the run.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Ignores all progress and never cancels.
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_phase(&self, _phase: PipelinePhase, _total: usize) {}
    fn on_progress(&self) {}
}

/// Atomic progress tracker that can be polled, and cancelled, from another thread.
pub struct AtomicProgressTracker {
    pub phase: Mutex<String>,
    pub completed: AtomicUsize,
    pub total: AtomicUsize,
    cancelled: AtomicBool,
}

impl Default for AtomicProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicProgressTracker {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(String::new()),
            completed: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Request cancellation of the run this tracker is attached to.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn current_phase(&self) -> String {
        match self.phase.lock() {
            Ok(phase) => phase.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProgressCallback for AtomicProgressTracker {
    fn on_phase(&self, phase: PipelinePhase, total: usize) {
        match self.phase.lock() {
            Ok(mut current) => *current = phase.as_str().to_string(),
            Err(poisoned) => *poisoned.into_inner() = phase.as_str().to_string(),
        }
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    fn on_progress(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
