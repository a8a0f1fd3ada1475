use chrono::{offset::Utc, DateTime};

/// A platform-emitted record of a pod state change.
///
/// Read once per delivery and never mutated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LifecycleEvent {
    /// Name of the Event object itself.
    pub event_name: String,

    /// UID of the Event object itself.
    pub event_uid: Option<String>,

    /// Kind of the involved object, e.g. `Pod`.
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub uid: Option<String>,

    /// Semantic reason, e.g. `Started` or `Killing`.
    pub reason: String,

    /// `Normal` or `Warning`.
    pub type_: String,

    /// How many times the platform has observed this event.
    pub count: i32,

    /// When the event was most recently observed.
    pub last_timestamp: Option<DateTime<Utc>>,
}

impl LifecycleEvent {
    pub const NORMAL: &'static str = "Normal";
    pub const WARNING: &'static str = "Warning";

    /// Identifies the Event object for deduplication, preferring its UID.
    ///
    /// Each container of a pod emits its own Event object, so this is not the
    /// involved pod's identity.
    pub fn event_key(&self) -> String {
        match self.event_uid.as_deref() {
            Some(uid) if !uid.is_empty() => uid.to_string(),
            _ => format!("{}/{}", self.namespace, self.event_name),
        }
    }
}
