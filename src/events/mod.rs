mod r#type;

pub use r#type::EventType;

use std::{any::Any, fmt, sync::Arc};

use crate::task::TaskId;

pub type EventData = Arc<dyn Any + Send + Sync>;

// Payload is shared so the receiving task and every listener observe the
// same delivery without copying it.
#[derive(Clone)]
pub struct Event {
    pub event_type: EventType,
    data: Option<EventData>,
    origin: Option<TaskId>,
}

impl Event {

    pub fn new<T>(event_type: impl Into<EventType>, data: T) -> Self
    where
        T: Any + Send + Sync
    {
        Self::from_shared(event_type, Arc::new(data))
    }

    pub fn from_shared(event_type: impl Into<EventType>, data: EventData) -> Self {
        Self {
            event_type: event_type.into(),
            data: Some(data),
            origin: None,
        }
    }

    pub fn empty(event_type: impl Into<EventType>) -> Self {
        Self {
            event_type: event_type.into(),
            data: None,
            origin: None,
        }
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn is_type(&self, event_type: &EventType) -> bool {
        self.event_type == *event_type
    }

    /// Borrows the payload as `T`, or `None` when the event carries no
    /// payload or a payload of another type.
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.as_deref()?.downcast_ref::<T>()
    }

    pub fn shared_data(&self) -> Option<&EventData> {
        self.data.as_ref()
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// The task that triggered this event, if it was triggered from task logic.
    pub fn origin(&self) -> Option<TaskId> {
        self.origin
    }

    pub (crate) fn with_origin(mut self, task: TaskId) -> Self {
        self.origin = Some(task);
        self
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("event_type", &self.event_type)
            .field("has_data", &self.has_data())
            .field("origin", &self.origin)
            .finish()
    }
}
