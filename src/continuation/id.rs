use std::{
    fmt,
    sync::atomic::{
        AtomicU64,
        Ordering
    }
};

/// Identifies one pause of one task. A task receives a fresh id every time
/// it parks, so an id never refers to two different suspension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContinuationId(u64);

impl ContinuationId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContinuationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cont#{}", self.0)
    }
}

#[derive(Debug)]
pub (crate) struct ContinuationIdGenerator {
    next: AtomicU64,
}

impl ContinuationIdGenerator {
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    pub fn next(&self) -> ContinuationId {
        ContinuationId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
