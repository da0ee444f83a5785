use std::{
    fmt,
    sync::{
        atomic::{
            AtomicU8,
            Ordering
        },
        Arc
    }
};

use super::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    Created = 0,
    Running = 1,
    Paused = 2,
    Completed = 3,
    Failed = 4,
    Cancelled = 5,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed | TaskState::Cancelled)
    }
}

impl From<u8> for TaskState {
    fn from(state: u8) -> Self {
        match state {
            0 => TaskState::Created,
            1 => TaskState::Running,
            2 => TaskState::Paused,
            3 => TaskState::Completed,
            4 => TaskState::Failed,
            5 => TaskState::Cancelled,
            _ => unreachable!(),
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Created => write!(f, "Created"),
            TaskState::Running => write!(f, "Running"),
            TaskState::Paused => write!(f, "Paused"),
            TaskState::Completed => write!(f, "Completed"),
            TaskState::Failed => write!(f, "Failed"),
            TaskState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Observer for a started task. Stays valid after the task finishes and
/// then reports its terminal state.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    state: Arc<AtomicU8>,
}

impl TaskHandle {

    pub (crate) fn new(id: TaskId) -> Self {
        Self {
            id,
            state: Arc::new(AtomicU8::new(TaskState::Created as u8)),
        }
    }

    pub fn id(&self) -> TaskId { self.id }

    pub fn state(&self) -> TaskState {
        self.state.load(Ordering::Acquire).into()
    }

    pub fn is_state(&self, state: TaskState) -> bool {
        self.state.load(Ordering::Acquire) == state as u8
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    pub (crate) fn set_state(&self, state: TaskState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub (crate) fn transition(&self, from: TaskState, to: TaskState) -> bool {
        self.state.compare_exchange(
            from as u8,
            to as u8,
            Ordering::AcqRel,
            Ordering::Acquire
        ).is_ok()
    }
}
