//! Trailing-edge debouncing for search input.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Quiet period before a search query fires
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Coalesces rapid calls so only the last one within the quiet period fires.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wait out the quiet period. Resolves to `Some(value)` only if no
    /// later call was made in the meantime.
    pub async fn settle<T>(&self, value: T) -> Option<T> {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;

        if self.generation.load(Ordering::SeqCst) == mine {
            Some(value)
        } else {
            None
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}
