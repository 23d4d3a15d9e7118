//! Idle-period gate for search-as-you-type.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default quiet period before a typed query is searched.
pub const DEFAULT_IDLE: Duration = Duration::from_millis(300);

/// Lets at most one search through per idle period.
///
/// Every call to [`Self::settle`] supersedes the calls before it. Only the
/// call that is still the newest once its idle period has elapsed gets its
/// query back.
#[derive(Debug)]
pub struct SearchDebouncer {
    idle: Duration,
    generation: AtomicU64,
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE)
    }
}

impl SearchDebouncer {
    /// Creates a debouncer that waits `idle` after each call.
    #[must_use]
    pub const fn new(idle: Duration) -> Self {
        Self {
            idle,
            generation: AtomicU64::new(0),
        }
    }

    /// The quiet period each call waits out.
    #[must_use]
    pub const fn idle(&self) -> Duration {
        self.idle
    }

    /// Waits out the idle period and returns `query` if nothing newer
    /// arrived meanwhile.
    pub async fn settle(&self, query: &str) -> Option<String> {
        let ticket = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tokio::time::sleep(self.idle).await;

        (self.generation.load(Ordering::Acquire) == ticket).then(|| query.to_string())
    }
}
