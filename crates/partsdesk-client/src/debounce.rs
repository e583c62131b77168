//! # Debouncer
//!
//! Collapses a burst of calls into the last one.
//!
//! ```text
//!   keystroke  c     ch    cha   chai  chain
//!   time(ms)   0     90    170   260   340 ─────── 740
//!   settle()   ✗     ✗     ✗     ✗     ✓  (only the last call survives
//!                                          the 400 ms quiet period)
//! ```
//!
//! Every call to [`Debouncer::settle`] takes a new generation number, sleeps
//! for the delay, and reports whether it is still the newest call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits out the delay. `true` if no newer call arrived meanwhile.
    pub async fn settle(&self) -> bool {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == mine
    }

    /// Makes every pending `settle` return `false`.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
