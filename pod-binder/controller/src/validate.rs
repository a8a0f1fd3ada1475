use chrono::{offset::Utc, DateTime, SubsecRound};
use pod_binder_core::LifecycleEvent;

/// Rejects events replayed from before the controller started and events
/// the platform has already seen more than once.
#[derive(Copy, Clone, Debug)]
pub struct EventValidator {
    started_at: DateTime<Utc>,
}

impl EventValidator {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self { started_at }
    }

    /// Starts the validator at the current second.
    ///
    /// Event timestamps carry whole seconds only, so a sub-second start time
    /// would reject events emitted in the same second the controller started.
    pub fn started_now() -> Self {
        Self::new(Utc::now().trunc_subsecs(0))
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_valid(&self, event: &LifecycleEvent) -> bool {
        if event.count != 1 {
            return false;
        }
        match event.last_timestamp {
            Some(ts) => ts >= self.started_at,
            None => false,
        }
    }
}
