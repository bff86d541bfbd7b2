//! Progress reporting.

/// Snapshot published while a search runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchProgress {
    /// Candidates fitted so far, counting cache hits.
    pub models_analyzed: usize,
    /// Fraction of the search done, in percent.
    pub percent_complete: f64,
}

/// Receives [`SearchProgress`] updates.
///
/// Called from the thread driving the search, never from worker threads.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: SearchProgress);
}

impl<F> ProgressObserver for F
where
    F: Fn(SearchProgress) + Send + Sync,
{
    fn on_progress(&self, progress: SearchProgress) {
        self(progress)
    }
}
