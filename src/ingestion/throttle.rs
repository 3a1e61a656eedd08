//! Minimum spacing between outgoing requests

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Hands out request slots at least `delay` apart, shared by every
/// concurrent fetch of a crawl
#[derive(Debug)]
pub struct RequestThrottle {
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait until this caller's slot comes up
    pub async fn acquire(&self) {
        if self.delay.is_zero() {
            return;
        }

        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next = Some(slot + self.delay);
            slot
        };

        tokio::time::sleep_until(slot).await;
    }
}
