//! Request pacing for the TMDB API.

use std::time::{Duration, Instant};

/// Default minimum interval between requests (~40 req/s).
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(25);

/// Hands out send slots at least `min_interval` apart.
///
/// Slots are reserved up front, so concurrent callers queue behind each
/// other instead of all waking at the same instant.
#[derive(Debug)]
pub struct RequestPacer {
    min_interval: Duration,
    next_slot: Option<Instant>,
}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl RequestPacer {
    /// Creates a pacer with the given minimum interval.
    pub(crate) const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: None,
        }
    }

    /// Reserves the next slot and returns how long to wait for it.
    pub(crate) fn reserve(&mut self, now: Instant) -> Duration {
        let slot = self.next_slot.map_or(now, |next| next.max(now));
        self.next_slot = slot.checked_add(self.min_interval);
        slot.saturating_duration_since(now)
    }

    /// Waits for the next slot.
    pub(crate) async fn wait(pacer: &tokio::sync::Mutex<Self>) {
        let delay = pacer.lock().await.reserve(Instant::now());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
