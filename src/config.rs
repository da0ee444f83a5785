use rustc_hash::FxHashSet;

use crate::{
    continuation::ContinuationConfig,
    events::EventType
};

#[derive(Debug, Clone, Default)]
pub struct WorkflowConfig {
    terminal_types: FxHashSet<EventType>,
    continuations: ContinuationConfig,
}

impl WorkflowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggered events of this type reach `TERMINAL` listeners.
    pub fn terminal_type(mut self, event_type: impl Into<EventType>) -> Self {
        self.terminal_types.insert(event_type.into());
        self
    }

    pub fn terminal_types<I, T>(mut self, event_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EventType>
    {
        self.terminal_types.extend(event_types.into_iter().map(Into::into));
        self
    }

    pub fn continuations(mut self, config: ContinuationConfig) -> Self {
        self.continuations = config;
        self
    }

    pub fn is_terminal(&self, event_type: &EventType) -> bool {
        self.terminal_types.contains(event_type)
    }

    pub fn continuation_config(&self) -> &ContinuationConfig {
        &self.continuations
    }
}
