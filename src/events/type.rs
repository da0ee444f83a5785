use std::{borrow::Cow, fmt};

/// Identity tag classifying an [`Event`](super::Event).
///
/// Two event types are equal when their keys are equal, regardless of
/// whether the key was borrowed from a static string or built at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventType(Cow<'static, str>);

impl EventType {

    /// Emitted to `COMPLETED` listeners when a task finishes without
    /// returning its own final event. Carries the task's `TaskId`.
    pub const COMPLETED: EventType = EventType::from_static("cl-workflow.completed");

    /// Emitted to `FAILED` listeners when a task fails. Carries a `TaskFailure`.
    pub const FAILED: EventType = EventType::from_static("cl-workflow.failed");

    pub const fn from_static(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }

    pub fn new(key: impl Into<String>) -> Self {
        Self(Cow::Owned(key.into()))
    }

    pub fn key(&self) -> &str {
        &self.0
    }

    pub fn is_reserved(&self) -> bool {
        *self == Self::COMPLETED || *self == Self::FAILED
    }
}

impl From<&'static str> for EventType {
    fn from(key: &'static str) -> Self {
        Self::from_static(key)
    }
}

impl From<String> for EventType {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl From<&EventType> for EventType {
    fn from(event_type: &EventType) -> Self {
        event_type.clone()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType {{ {:?} }}", self.key())
    }
}
