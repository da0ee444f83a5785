use thiserror::Error;

#[macro_use]
pub (crate) mod logging;

pub mod config;
pub mod continuation;
pub mod error;
pub mod events;
pub mod listeners;
pub mod task;
pub mod workflow;

pub use config::WorkflowConfig;
pub use continuation::{
    ContinuationConfig,
    ContinuationError,
    ContinuationId,
    ContinuationManager
};
pub use error::{
    ListenerError,
    ListenerErrors,
    TaskError,
    TaskExecutionError,
    TaskFailure,
    WorkflowError
};
pub use events::{Event, EventType};
pub use listeners::{
    EventListener,
    ListenerFlags,
    ListenerId,
    Subscription,
    SubscriptionError
};
pub use task::{
    BoxError,
    PauseFuture,
    TaskContext,
    TaskHandle,
    TaskId,
    TaskOutput,
    TaskState
};
pub use workflow::{Delivery, Workflow};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Continuation error: {0}")]
    Continuation(#[from] ContinuationError),

    #[error("Subscription error: {0}")]
    Subscription(#[from] SubscriptionError),
}

pub type Result<T> = std::result::Result<T, Error>;
