use std::{
    fmt,
    time::{
        Duration,
        Instant
    }
};

use crate::{
    events::EventType,
    task::{Task, TaskId}
};
use super::ContinuationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Running,
    Paused,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextState::Running => write!(f, "Running"),
            ContextState::Paused => write!(f, "Paused"),
        }
    }
}

/// Suspended call state of exactly one task.
///
/// While the task runs, the context only records bookkeeping; the task
/// future is owned by the thread driving it. While paused, the context owns
/// the future, and whoever claims it becomes the only thread able to resume it.
pub struct ContinuationContext {
    id: ContinuationId,
    task: TaskId,
    state: ContextState,
    waiting_on: Option<EventType>,
    created: Instant,
    paused_at: Option<Instant>,
    continuable: Option<Task>,
}

impl fmt::Debug for ContinuationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuationContext")
            .field("id", &self.id)
            .field("task", &self.task)
            .field("state", &self.state)
            .field("waiting_on", &self.waiting_on)
            .finish()
    }
}

impl ContinuationContext {

    pub (crate) fn new(id: ContinuationId, task: TaskId) -> Self {
        Self {
            id,
            task,
            state: ContextState::Running,
            waiting_on: None,
            created: Instant::now(),
            paused_at: None,
            continuable: None,
        }
    }

    pub fn id(&self) -> ContinuationId { self.id }
    pub fn task(&self) -> TaskId { self.task }
    pub fn state(&self) -> ContextState { self.state }
    pub fn waiting_on(&self) -> Option<&EventType> { self.waiting_on.as_ref() }
    pub fn created(&self) -> Instant { self.created }
    pub fn paused_at(&self) -> Option<Instant> { self.paused_at }

    pub fn is_paused(&self) -> bool {
        self.state == ContextState::Paused
    }

    pub fn is_expired(&self, duration: Option<Duration>, now: Instant) -> bool {
        match (duration, self.paused_at) {
            (Some(duration), Some(paused_at)) if self.is_paused() => {
                now.saturating_duration_since(paused_at) >= duration
            }
            _ => false,
        }
    }

    pub (crate) fn is_resumable(
        &self,
        event_type: &EventType,
        duration: Option<Duration>,
        now: Instant
    ) -> bool {
        self.is_paused() &&
        self.waiting_on.as_ref() == Some(event_type) &&
        !self.is_expired(duration, now)
    }

    pub (crate) fn park(&mut self, id: ContinuationId, event_type: EventType, continuable: Task) {
        self.id = id;
        self.state = ContextState::Paused;
        self.waiting_on = Some(event_type);
        self.paused_at = Some(Instant::now());
        self.continuable = Some(continuable);
    }

    pub (crate) fn resume(&mut self) -> Option<Task> {
        self.state = ContextState::Running;
        self.waiting_on = None;
        self.paused_at = None;
        self.continuable.take()
    }

    pub (crate) fn into_continuable(self) -> Option<Task> {
        self.continuable
    }

    pub fn snapshot(&self) -> ContinuationSnapshot {
        ContinuationSnapshot {
            id: self.id,
            task: self.task,
            state: self.state,
            waiting_on: self.waiting_on.clone(),
            paused_for: self.paused_at.map(|at| at.elapsed()),
        }
    }
}

/// Read-only view of a context, safe to hand out of the registry lock.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationSnapshot {
    pub id: ContinuationId,
    pub task: TaskId,
    pub state: ContextState,
    pub waiting_on: Option<EventType>,
    pub paused_for: Option<Duration>,
}
