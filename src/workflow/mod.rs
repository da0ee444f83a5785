mod dispatch;

use std::{
    any::Any,
    fmt,
    panic::{
        self,
        AssertUnwindSafe
    },
    sync::Arc
};

use dashmap::DashMap;

use crate::{
    config::WorkflowConfig,
    continuation::ContinuationManager,
    error::{panic_message, TaskError, WorkflowError},
    events::{Event, EventType},
    listeners::{
        EventListener,
        ListenerFlags,
        ListenerId,
        ListenerRegistry,
        Subscription
    },
    task::{
        Task,
        TaskContext,
        TaskHandle,
        TaskId,
        TaskOutput,
        TaskState
    }
};
use dispatch::Dispatch;

/// Result of delivering a triggered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Resumed(TaskId),
    // Nobody was waiting; the event was dropped.
    Unmatched,
}

impl Delivery {
    pub fn task(&self) -> Option<TaskId> {
        match self {
            Delivery::Resumed(task) => Some(*task),
            Delivery::Unmatched => None,
        }
    }
}

pub (crate) struct Shared {
    config: WorkflowConfig,
    manager: ContinuationManager,
    tasks: DashMap<TaskId, TaskHandle>,
    listeners: Arc<ListenerRegistry>,
}

impl Shared {
    fn should_purge(&self) -> bool {
        self.config.continuation_config().should_purge(&mut rand::thread_rng())
    }
}

/// A workflow runtime: starts tasks, routes triggered events to the tasks
/// paused on them and notifies listeners.
///
/// Every call drives the affected tasks on the calling thread until they
/// pause again or finish. Cloning yields another handle to the same runtime.
#[derive(Clone)]
pub struct Workflow {
    inner: Arc<Shared>,
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("active_tasks", &self.inner.tasks.len())
            .field("continuations", &self.inner.manager.len())
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {

    pub fn new() -> Self {
        Self::with_config(WorkflowConfig::default())
    }

    pub fn with_config(config: WorkflowConfig) -> Self {
        let manager = ContinuationManager::new(*config.continuation_config());
        Self {
            inner: Arc::new(Shared {
                config,
                manager,
                tasks: DashMap::new(),
                listeners: Arc::new(ListenerRegistry::new()),
            }),
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.inner.config
    }

    pub fn manager(&self) -> &ContinuationManager {
        &self.inner.manager
    }

    /// Creates a task from `factory` and runs it until its first pause point.
    ///
    /// Events the task triggers along the way are delivered before this
    /// returns. A failure of this or any task it resumed is returned as
    /// [`WorkflowError::TaskExecution`]. When only listeners failed, the
    /// returned [`WorkflowError::Listeners`] names the started task.
    pub fn start<F, Fut>(&self, factory: F) -> Result<TaskHandle, WorkflowError>
    where
        F: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = TaskOutput> + Send + 'static
    {
        let handle = TaskHandle::new(TaskId::next());
        let id = handle.id();
        self.inner.manager.create(id)?;

        let mut dispatch = Dispatch::new(&self.inner);
        match panic::catch_unwind(AssertUnwindSafe(|| Task::new(handle.clone(), factory))) {
            Ok(task) => {
                handle.transition(TaskState::Created, TaskState::Running);
                self.inner.tasks.insert(id, handle.clone());
                info!("Starting {}", id);
                dispatch.run_task(task, None);
            }
            Err(payload) => {
                let error = TaskError::Panicked(panic_message(payload.as_ref()));
                dispatch.fail(id, &handle, error);
            }
        }

        dispatch.run().map_err(|e| e.for_task(Some(id)))?;
        Ok(handle)
    }

    pub fn trigger<T>(
        &self,
        event_type: impl Into<EventType>,
        data: T
    ) -> Result<Delivery, WorkflowError>
    where
        T: Any + Send + Sync
    {
        self.trigger_event(Event::new(event_type, data))
    }

    /// Resumes the first task paused on the event's type, in the order the
    /// tasks paused. An event nobody waits on is dropped.
    pub fn trigger_event(&self, event: Event) -> Result<Delivery, WorkflowError> {
        let mut dispatch = Dispatch::new(&self.inner);
        let delivery = dispatch.deliver(event);
        dispatch.run().map_err(|e| e.for_task(delivery.task()))?;
        Ok(delivery)
    }

    pub fn inform<T>(&self, event_type: impl Into<EventType>, data: T) -> Result<(), WorkflowError>
    where
        T: Any + Send + Sync
    {
        self.trigger(event_type, data).map(|_| ())
    }

    /// Resumes `task` specifically. Fails with `NoSuchContinuation` unless
    /// it is paused on `event`'s type.
    pub fn resume(&self, task: TaskId, event: Event) -> Result<TaskState, WorkflowError> {
        let claimed = self.inner.manager.claim(task, &event.event_type)?;
        let handle = claimed.handle().clone();
        info!("Resuming {} with {}", task, event.event_type);

        let mut dispatch = Dispatch::new(&self.inner);
        dispatch.deliver_to(claimed, event);
        dispatch.run().map_err(|e| e.for_task(Some(task)))?;
        Ok(handle.state())
    }

    /// Drops a paused task. Its future is destroyed, so values it holds
    /// across the pause point are dropped here.
    pub fn cancel(&self, task: TaskId) -> Result<(), WorkflowError> {
        let handle = self.handle(task).ok_or(WorkflowError::UnknownTask { task })?;

        let claimed = self.inner.manager
            .claim_parked(task)
            .map_err(|_| WorkflowError::NotPaused { task, state: handle.state() })?;

        self.inner.manager.dispose(task);
        self.inner.tasks.remove(&task);
        handle.set_state(TaskState::Cancelled);
        drop(claimed);
        info!("{} cancelled", task);
        Ok(())
    }

    pub fn add_listener<L>(&self, flags: ListenerFlags, listener: L) -> ListenerId
    where
        L: EventListener + 'static
    {
        self.inner.listeners.register(flags, listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.deregister(id)
    }

    pub fn subscribe(&self, flags: ListenerFlags) -> Subscription {
        Subscription::register(&self.inner.listeners, flags)
    }

    /// `None` once the task has finished.
    pub fn state(&self, task: TaskId) -> Option<TaskState> {
        self.inner.tasks.get(&task).map(|handle| handle.state())
    }

    pub fn handle(&self, task: TaskId) -> Option<TaskHandle> {
        self.inner.tasks.get(&task).map(|entry| entry.value().clone())
    }

    pub fn active_tasks(&self) -> usize {
        self.inner.tasks.len()
    }

    pub fn waiting_on(&self, task: TaskId) -> Option<EventType> {
        self.inner.manager.waiting_on(task)
    }

    /// Fails every task paused past the continuation duration and returns
    /// their ids. The tasks are purged even when a `FAILED` listener errors.
    pub fn purge_expired(&self) -> Result<Vec<TaskId>, WorkflowError> {
        let mut dispatch = Dispatch::new(&self.inner);
        let purged = dispatch.purge();
        dispatch.run()?;
        Ok(purged)
    }
}
