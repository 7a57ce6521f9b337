use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Delays an action until input has been quiet for a while.
///
/// Every call to [Debounce::settle] supersedes the calls before it,
/// only the most recent one reports that it survived the delay.
#[derive(Debug)]
pub struct Debounce {
    delay: Duration,
    generation: AtomicU64,
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait for the delay, returning whether no newer call or cancel happened meanwhile.
    pub async fn settle(&self) -> bool {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Abandon any pending call.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
