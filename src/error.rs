use std::{any::Any, fmt};

use thiserror::Error;

use crate::{
    continuation::ContinuationError,
    events::EventType,
    listeners::ListenerId,
    task::{BoxError, TaskId, TaskState}
};

/// Why a task body stopped without completing.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task returned an error: {0}")]
    Failed(#[source] BoxError),

    #[error("Task panicked: {0}")]
    Panicked(String),

    #[error("Task suspended outside of a pause point")]
    ForeignSuspension,

    #[error("Continuation expired while paused")]
    Expired,

    #[error("Continuation error: {0}")]
    Continuation(#[from] ContinuationError),
}

#[derive(Debug, Error)]
#[error("Task {task} failed: {source}")]
pub struct TaskExecutionError {
    pub task: TaskId,

    #[source]
    pub source: TaskError,
}

impl TaskExecutionError {
    pub fn new(task: TaskId, source: TaskError) -> Self {
        Self { task, source }
    }
}

/// Payload of the built-in `EventType::FAILED` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub task: TaskId,
    pub message: String,
}

#[derive(Debug, Clone, Error)]
#[error("Listener {listener} failed on {event_type}: {message}")]
pub struct ListenerError {
    pub listener: ListenerId,
    pub event_type: EventType,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ListenerErrors(pub Vec<ListenerError>);

impl ListenerErrors {
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &ListenerError> { self.0.iter() }
}

impl fmt::Display for ListenerErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} listener(s) failed", self.0.len())?;
        for error in &self.0 {
            write!(f, "; {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ListenerErrors {}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    TaskExecution(#[from] TaskExecutionError),

    #[error("Continuation error: {0}")]
    Continuation(#[from] ContinuationError),

    // The delivery itself went through; only listeners failed. `task` is
    // the task the call started or resumed, which is still live.
    #[error("Listener error: {errors}")]
    Listeners {
        task: Option<TaskId>,
        errors: ListenerErrors,
    },

    #[error("Task {task} is not paused (state: {state})")]
    NotPaused {
        task: TaskId,
        state: TaskState,
    },

    #[error("Task {task} is not active in this workflow")]
    UnknownTask {
        task: TaskId,
    },
}

impl WorkflowError {
    /// The task whose execution failed, when this is a task failure.
    pub fn failed_task(&self) -> Option<TaskId> {
        match self {
            WorkflowError::TaskExecution(e) => Some(e.task),
            _ => None,
        }
    }

    pub (crate) fn for_task(self, task: Option<TaskId>) -> Self {
        match self {
            WorkflowError::Listeners { task: None, errors } => {
                WorkflowError::Listeners { task, errors }
            }
            other => other,
        }
    }
}

pub (crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unknown panic payload")
    }
}
