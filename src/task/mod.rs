use std::{
    collections::VecDeque,
    panic::{
        self,
        AssertUnwindSafe
    },
    pin::Pin,
    task::{
        Context,
        Poll
    }
};

pub mod context;
pub mod id;
pub mod state;

pub use context::{PauseFuture, TaskContext};
pub use id::TaskId;
pub use state::{TaskHandle, TaskState};

use crate::{
    error::{panic_message, TaskError},
    events::{Event, EventType}
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What a task body evaluates to. `Some(event)` is handed to `COMPLETED`
/// listeners as the task's final event.
pub type TaskOutput = Result<Option<Event>, BoxError>;

/// Outcome of driving a task from one pause point to the next.
#[derive(Debug)]
pub (crate) enum Step {
    Suspended(EventType),
    Completed(Option<Event>),
    Failed(TaskError),
}

// The pinned future is the continuation: the compiler-generated state
// machine holds the captured locals and the resumption point.
pub struct Task {
    future: Pin<Box<dyn Future<Output = TaskOutput> + Send>>,
    context: TaskContext,
    handle: TaskHandle,
    pub id: TaskId,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("state", &self.handle.state())
            .finish()
    }
}

impl Task {
    pub (crate) fn new<F, Fut>(handle: TaskHandle, factory: F) -> Self
    where
        F: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = TaskOutput> + Send + 'static
    {
        let id = handle.id();
        let context = TaskContext::new(id);
        let future = factory(context.clone());
        Self {
            future: Box::pin(future),
            context,
            handle,
            id,
        }
    }

    pub (crate) fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    /// Runs the task body until it reaches a pause point or finishes.
    /// `answer` becomes the value of the pause point being resumed.
    pub (crate) fn step(&mut self, answer: Option<Event>) -> Step {
        if let Some(event) = answer {
            self.context.answer(event);
        }

        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        let polled = panic::catch_unwind(AssertUnwindSafe(|| {
            self.future.as_mut().poll(&mut cx)
        }));
        self.context.discard_answer();

        match polled {
            Ok(Poll::Ready(Ok(event))) => Step::Completed(event),
            Ok(Poll::Ready(Err(e))) => Step::Failed(TaskError::Failed(e)),
            Ok(Poll::Pending) => match self.context.take_request() {
                Some(event_type) => Step::Suspended(event_type),
                None => Step::Failed(TaskError::ForeignSuspension),
            },
            Err(payload) => Step::Failed(TaskError::Panicked(panic_message(payload.as_ref()))),
        }
    }

    pub (crate) fn drain_outbox(&self) -> VecDeque<Event> {
        self.context.drain_outbox()
    }
}
