pub mod config;
pub mod context;
pub mod id;
pub mod manager;

pub use config::ContinuationConfig;
pub use context::{ContextState, ContinuationContext, ContinuationSnapshot};
pub use id::ContinuationId;
pub use manager::ContinuationManager;

use thiserror::Error;

use crate::{events::EventType, task::TaskId};

#[derive(Debug, Clone, Error)]
pub enum ContinuationError {
    #[error("Task {task} already has a live continuation")]
    DuplicateContinuation {
        task: TaskId,
    },

    // Non-fatal: the event simply was not delivered.
    #[error("No continuation waiting on {event_type} (task: {task:?})")]
    NoSuchContinuation {
        task: Option<TaskId>,
        event_type: EventType,
    },

    #[error("Task {task} is not paused")]
    NotParked {
        task: TaskId,
    },

    #[error("Task {task} has no live continuation")]
    NoLiveContext {
        task: TaskId,
    },
}
