use std::{
    collections::{
        hash_map::Entry,
        VecDeque
    },
    time::Instant
};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::{
    events::EventType,
    task::{Task, TaskId}
};
use super::{
    id::ContinuationIdGenerator,
    ContinuationConfig,
    ContinuationContext,
    ContinuationError,
    ContinuationId,
    ContinuationSnapshot
};

#[derive(Debug, Default)]
struct Registry {
    contexts: FxHashMap<TaskId, ContinuationContext>,
    // FIFO in registration order; a queue is removed as soon as it empties.
    waiters: FxHashMap<EventType, VecDeque<TaskId>>,
    ids: FxHashMap<ContinuationId, TaskId>,
}

impl Registry {
    fn unregister_waiter(
        waiters: &mut FxHashMap<EventType, VecDeque<TaskId>>,
        task: TaskId,
        event_type: &EventType
    ) {
        if let Some(queue) = waiters.get_mut(event_type) {
            queue.retain(|waiting| *waiting != task);
            if queue.is_empty() {
                waiters.remove(event_type);
            }
        }
    }

    fn remove(&mut self, task: TaskId) -> Option<ContinuationContext> {
        let context = self.contexts.remove(&task)?;
        if let Some(event_type) = context.waiting_on() {
            Self::unregister_waiter(&mut self.waiters, task, event_type);
        }
        self.ids.remove(&context.id());
        Some(context)
    }

    fn detach(&mut self, task: TaskId) -> Option<Task> {
        let context = self.contexts.get_mut(&task)?;
        if let Some(event_type) = context.waiting_on().cloned() {
            Self::unregister_waiter(&mut self.waiters, task, &event_type);
        }
        context.resume()
    }
}

/// Registry of live continuation contexts, one per active task, indexed by
/// task, by continuation id and by the event type each paused task awaits.
///
/// Every mutation is serialized by a single lock, which is never held while
/// task or listener code runs. Task futures leaving the registry are handed
/// back to the caller so they are dropped or resumed outside the lock.
#[derive(Debug)]
pub struct ContinuationManager {
    registry: Mutex<Registry>,
    config: ContinuationConfig,
    ids: ContinuationIdGenerator,
}

impl ContinuationManager {

    pub fn new(config: ContinuationConfig) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            config,
            ids: ContinuationIdGenerator::new(),
        }
    }

    pub fn config(&self) -> &ContinuationConfig {
        &self.config
    }

    pub fn create(&self, task: TaskId) -> Result<ContinuationId, ContinuationError> {
        let mut registry = self.registry.lock();
        let id = match registry.contexts.entry(task) {
            Entry::Occupied(_) => {
                return Err(ContinuationError::DuplicateContinuation { task });
            }
            Entry::Vacant(entry) => {
                let id = self.ids.next();
                entry.insert(ContinuationContext::new(id, task));
                id
            }
        };
        registry.ids.insert(id, task);
        Ok(id)
    }

    // Registration and storing the future happen under one lock, so a
    // concurrent trigger either misses the task entirely or claims it whole.
    pub (crate) fn park(
        &self,
        continuable: Task,
        event_type: EventType
    ) -> Result<ContinuationId, ContinuationError> {
        let task = continuable.id;
        let mut registry = self.registry.lock();
        let Registry { contexts, waiters, ids } = &mut *registry;

        let Some(context) = contexts.get_mut(&task) else {
            return Err(ContinuationError::NoLiveContext { task });
        };

        if let Some(previous) = context.waiting_on() {
            Registry::unregister_waiter(waiters, task, previous);
        }

        let id = self.ids.next();
        ids.remove(&context.id());
        ids.insert(id, task);
        context.park(id, event_type.clone(), continuable);
        waiters.entry(event_type).or_default().push_back(task);

        Ok(id)
    }

    /// Claims the first task, in registration order, that is paused on
    /// `event_type`. Expired continuations are skipped and left for purging.
    pub (crate) fn claim_next(&self, event_type: &EventType) -> Option<Task> {
        let now = Instant::now();
        let duration = self.config.duration();
        let mut registry = self.registry.lock();

        let task = {
            let queue = registry.waiters.get(event_type)?;
            let position = queue.iter().position(|task| {
                registry.contexts
                    .get(task)
                    .is_some_and(|context| context.is_resumable(event_type, duration, now))
            })?;
            queue[position]
        };

        registry.detach(task)
    }

    pub (crate) fn claim(
        &self,
        task: TaskId,
        event_type: &EventType
    ) -> Result<Task, ContinuationError> {
        let now = Instant::now();
        let duration = self.config.duration();
        let mut registry = self.registry.lock();

        let resumable = registry.contexts
            .get(&task)
            .is_some_and(|context| context.is_resumable(event_type, duration, now));

        if !resumable {
            return Err(ContinuationError::NoSuchContinuation {
                task: Some(task),
                event_type: event_type.clone(),
            });
        }

        registry.detach(task).ok_or(ContinuationError::NotParked { task })
    }

    /// Claims a paused task whatever it is waiting on.
    pub (crate) fn claim_parked(&self, task: TaskId) -> Result<Task, ContinuationError> {
        let mut registry = self.registry.lock();
        let paused = registry.contexts.get(&task).is_some_and(|c| c.is_paused());
        if !paused {
            return Err(ContinuationError::NotParked { task });
        }
        registry.detach(task).ok_or(ContinuationError::NotParked { task })
    }

    /// Removes every trace of `task`. A parked future is returned so the
    /// caller can drop it outside the lock.
    pub (crate) fn dispose(&self, task: TaskId) -> Option<Task> {
        let context = self.registry.lock().remove(task)?;
        context.into_continuable()
    }

    pub (crate) fn purge_expired(&self) -> Vec<Task> {
        let Some(duration) = self.config.duration() else {
            return Vec::new();
        };
        let now = Instant::now();
        let mut registry = self.registry.lock();

        let expired: Vec<TaskId> = registry.contexts
            .values()
            .filter(|context| context.is_expired(Some(duration), now))
            .map(|context| context.task())
            .collect();

        expired
            .into_iter()
            .filter_map(|task| registry.remove(task))
            .filter_map(|context| context.into_continuable())
            .collect()
    }

    pub fn get(&self, id: ContinuationId) -> Option<ContinuationSnapshot> {
        let registry = self.registry.lock();
        let task = registry.ids.get(&id)?;
        registry.contexts.get(task).map(|context| context.snapshot())
    }

    pub fn context_of(&self, task: TaskId) -> Option<ContinuationSnapshot> {
        self.registry.lock().contexts.get(&task).map(|context| context.snapshot())
    }

    pub fn waiting_on(&self, task: TaskId) -> Option<EventType> {
        self.registry.lock().contexts.get(&task)?.waiting_on().cloned()
    }

    pub fn waiter_count(&self, event_type: &EventType) -> usize {
        self.registry.lock().waiters.get(event_type).map_or(0, |queue| queue.len())
    }

    pub fn has_waiters(&self) -> bool {
        !self.registry.lock().waiters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.registry.lock().contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.lock().contexts.is_empty()
    }
}
