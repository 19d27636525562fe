//! Client-side rate limiting for outbound catalog calls.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum wall-clock gap between outbound requests.
///
/// One throttle is shared by every caller of the catalog client, not one
/// per caller, so concurrent sync requests serialize against it instead of
/// bursting the external API. A call arriving before the gap has elapsed
/// sleeps the remaining delta before proceeding.
#[derive(Debug)]
pub struct Throttle {
    min_gap: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Throttle {
    #[must_use]
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last_call: Mutex::new(None),
        }
    }

    /// Waits until at least `min_gap` has passed since the previous call and
    /// claims the current slot.
    ///
    /// The internal lock is held across the sleep on purpose: a second
    /// concurrent caller queues behind the first rather than both timing
    /// their gap from the same earlier request.
    pub async fn wait(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_gap {
                tokio::time::sleep(self.min_gap - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
