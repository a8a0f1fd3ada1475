use ahash::AHashMap as HashMap;
use pod_binder_core::LifecycleEvent;
use tokio::time::{Duration, Instant};

/// Events expire from the API server after an hour by default, so relists
/// can redeliver an accepted Event object for at least that long.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(2 * 60 * 60);

/// Remembers recently accepted Event objects so that a redelivered object is
/// only acted on once within `window`.
///
/// Keyed by the Event object's own identity, so distinct events about the
/// same pod are never suppressed. Owned by the single delivery path.
#[derive(Debug)]
pub struct Deduplicator {
    window: Duration,
    seen: HashMap<String, Instant>,
}

impl Deduplicator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: HashMap::new(),
        }
    }

    /// A zero window disables deduplication.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Records the event, returning `false` if the same Event object was
    /// already recorded within the window.
    pub fn observe(&mut self, event: &LifecycleEvent) -> bool {
        if self.window.is_zero() {
            return true;
        }

        let now = Instant::now();
        let window = self.window;
        self.seen.retain(|_, at| now.saturating_duration_since(*at) < window);

        let key = event.event_key();
        if self.seen.contains_key(&key) {
            return false;
        }
        self.seen.insert(key, now);
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
