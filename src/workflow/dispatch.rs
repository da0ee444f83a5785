use std::collections::VecDeque;

use crate::{
    error::{
        ListenerError,
        ListenerErrors,
        TaskError,
        TaskExecutionError,
        TaskFailure,
        WorkflowError
    },
    events::{Event, EventType},
    listeners::ListenerFlags,
    task::{Step, Task, TaskHandle, TaskId, TaskState}
};
use super::{Delivery, Shared};

enum Work {
    Step {
        task: Task,
        answer: Option<Event>,
    },
    Deliver(Event),
}

/// Drives tasks on the calling thread.
///
/// Work is processed FIFO: a resumed task runs before anything queued
/// behind the delivery that resumed it, and events a task triggers are
/// queued behind the work already pending, so ping-pong between tasks runs
/// as a flat loop rather than nested resumes.
pub (super) struct Dispatch<'w> {
    shared: &'w Shared,
    queue: VecDeque<Work>,
    failure: Option<TaskExecutionError>,
    listener_errors: Vec<ListenerError>,
}

impl<'w> Dispatch<'w> {

    pub fn new(shared: &'w Shared) -> Self {
        Self {
            shared,
            queue: VecDeque::new(),
            failure: None,
            listener_errors: Vec::new(),
        }
    }

    pub fn run_task(&mut self, task: Task, answer: Option<Event>) {
        self.queue.push_front(Work::Step { task, answer });
    }

    /// Resumes the first task waiting on the event's type, if any, and
    /// notifies listeners of the event.
    pub fn deliver(&mut self, event: Event) -> Delivery {
        if self.shared.should_purge() {
            self.purge();
        }

        let delivery = match self.shared.manager.claim_next(&event.event_type) {
            Some(task) => {
                let id = task.id;
                info!("Delivering {} to {}", event.event_type, id);
                task.handle().set_state(TaskState::Running);
                self.run_task(task, Some(event.clone()));
                Delivery::Resumed(id)
            }
            None => {
                info!("No task waiting on {}, event dropped", event.event_type);
                Delivery::Unmatched
            }
        };

        self.notify_triggered(&event);
        delivery
    }

    /// Hands `event` to a task already claimed for it.
    pub fn deliver_to(&mut self, task: Task, event: Event) {
        task.handle().set_state(TaskState::Running);
        self.run_task(task, Some(event.clone()));
        self.notify_triggered(&event);
    }

    pub fn run(mut self) -> Result<(), WorkflowError> {
        while let Some(work) = self.queue.pop_front() {
            match work {
                Work::Step { task, answer } => self.step(task, answer),
                Work::Deliver(event) => { self.deliver(event); }
            }
        }
        self.finish()
    }

    fn finish(self) -> Result<(), WorkflowError> {
        if let Some(failure) = self.failure {
            return Err(failure.into());
        }
        if !self.listener_errors.is_empty() {
            return Err(WorkflowError::Listeners {
                task: None,
                errors: ListenerErrors(self.listener_errors),
            });
        }
        Ok(())
    }

    fn step(&mut self, mut task: Task, answer: Option<Event>) {
        let id = task.id;
        let step = task.step(answer);

        // Events sent before the task paused, finished or failed still go out.
        for event in task.drain_outbox() {
            self.queue.push_back(Work::Deliver(event));
        }

        match step {
            Step::Suspended(event_type) => self.park(task, event_type),
            Step::Completed(event) => {
                drop(task);
                self.complete(id, event);
            }
            Step::Failed(error) => {
                let handle = task.handle().clone();
                drop(task);
                self.fail(id, &handle, error);
            }
        }
    }

    fn park(&mut self, task: Task, event_type: EventType) {
        let id = task.id;
        let handle = task.handle().clone();

        // Paused must be visible before the task becomes claimable.
        handle.set_state(TaskState::Paused);
        match self.shared.manager.park(task, event_type.clone()) {
            Ok(continuation) => {
                info!("{} paused on {} as {}", id, event_type, continuation);
            }
            Err(e) => self.fail(id, &handle, TaskError::Continuation(e)),
        }
    }

    fn complete(&mut self, id: TaskId, event: Option<Event>) {
        self.shared.manager.dispose(id);
        if let Some(handle) = self.shared.tasks.remove(&id).map(|(_, handle)| handle) {
            handle.set_state(TaskState::Completed);
        }
        info!("{} completed", id);

        let event = match event {
            Some(event) => event.with_origin(id),
            None => Event::new(EventType::COMPLETED, id).with_origin(id),
        };
        self.notify(&event, ListenerFlags::COMPLETED);
    }

    pub fn fail(&mut self, id: TaskId, handle: &TaskHandle, error: TaskError) {
        // Dropping a parked future unwinds its captured state.
        drop(self.shared.manager.dispose(id));
        self.shared.tasks.remove(&id);
        handle.set_state(TaskState::Failed);
        error!("{} failed: {}", id, error);

        let failure = TaskFailure { task: id, message: error.to_string() };
        self.notify(&Event::new(EventType::FAILED, failure).with_origin(id), ListenerFlags::FAILED);

        if self.failure.is_none() {
            self.failure = Some(TaskExecutionError::new(id, error));
        }
    }

    pub fn purge(&mut self) -> Vec<TaskId> {
        let expired = self.shared.manager.purge_expired();
        let mut purged = Vec::with_capacity(expired.len());
        for task in expired {
            let id = task.id;
            let handle = task.handle().clone();
            drop(task);
            info!("{} expired while paused", id);

            self.shared.tasks.remove(&id);
            handle.set_state(TaskState::Failed);
            let failure = TaskFailure { task: id, message: TaskError::Expired.to_string() };
            self.notify(&Event::new(EventType::FAILED, failure).with_origin(id), ListenerFlags::FAILED);
            purged.push(id);
        }
        purged
    }

    fn notify_triggered(&mut self, event: &Event) {
        let mut occurrence = ListenerFlags::TRIGGERED;
        if self.shared.config.is_terminal(&event.event_type) {
            occurrence |= ListenerFlags::TERMINAL;
        }
        self.notify(event, occurrence);
    }

    fn notify(&mut self, event: &Event, occurrence: ListenerFlags) {
        let errors = self.shared.listeners.notify(event, occurrence);
        self.listener_errors.extend(errors);
    }
}
