use std::{
    any::Any,
    collections::VecDeque,
    sync::Arc,
    task::Poll
};

use parking_lot::Mutex;

use crate::events::{Event, EventType};
use super::TaskId;

#[derive(Debug, Default)]
struct Mailbox {
    // Set by a pause point that has not been answered yet.
    requested: Option<EventType>,
    answer: Option<Event>,
    outbox: VecDeque<Event>,
}

/// Handle given to task logic. The only way a task body suspends is by
/// awaiting [`TaskContext::pause_for_event`].
#[derive(Debug, Clone)]
pub struct TaskContext {
    id: TaskId,
    mailbox: Arc<Mutex<Mailbox>>,
}

impl TaskContext {

    pub (crate) fn new(id: TaskId) -> Self {
        Self {
            id,
            mailbox: Arc::new(Mutex::new(Mailbox::default())),
        }
    }

    pub fn id(&self) -> TaskId { self.id }

    /// Suspends the task until an event of `event_type` is delivered to it,
    /// and evaluates to that event.
    pub fn pause_for_event(&self, event_type: impl Into<EventType>) -> PauseFuture<'_> {
        PauseFuture {
            context: self,
            event_type: event_type.into(),
            requested: false,
        }
    }

    /// Queues an event for delivery. It is dispatched on the driving thread
    /// once this task reaches its next pause point or finishes.
    pub fn trigger<T>(&self, event_type: impl Into<EventType>, data: T)
    where
        T: Any + Send + Sync
    {
        self.trigger_event(Event::new(event_type, data));
    }

    pub fn trigger_event(&self, event: Event) {
        self.mailbox.lock().outbox.push_back(event.with_origin(self.id));
    }

    pub (crate) fn answer(&self, event: Event) {
        self.mailbox.lock().answer = Some(event);
    }

    // An answer no pause point accepted during the step is not kept around.
    pub (crate) fn discard_answer(&self) -> Option<Event> {
        self.mailbox.lock().answer.take()
    }

    pub (crate) fn take_request(&self) -> Option<EventType> {
        self.mailbox.lock().requested.take()
    }

    pub (crate) fn drain_outbox(&self) -> VecDeque<Event> {
        std::mem::take(&mut self.mailbox.lock().outbox)
    }
}

pub struct PauseFuture<'c> {
    context: &'c TaskContext,
    event_type: EventType,
    requested: bool,
}

impl std::future::Future for PauseFuture<'_> {
    type Output = Event;

    fn poll(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>
    ) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut mailbox = this.context.mailbox.lock();

        if this.requested {
            let answered = mailbox.answer
                .as_ref()
                .is_some_and(|event| event.event_type == this.event_type);
            if answered {
                if let Some(event) = mailbox.answer.take() {
                    return Poll::Ready(event);
                }
            }
        }

        // Latest pause point wins; the driver parks the task under this type.
        mailbox.requested = Some(this.event_type.clone());
        this.requested = true;
        Poll::Pending
    }
}
