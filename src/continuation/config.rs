use std::time::Duration;

use rand::Rng;

pub const DEFAULT_CONTINUATION_DURATION: Duration = Duration::from_secs(20 * 60);
pub const DEFAULT_PURGE_FREQUENCY: u32 = 20;
pub const DEFAULT_PURGE_SCALE: u32 = 1000;

/// Lifetime policy for parked continuations.
///
/// A continuation that stays paused longer than the configured duration is
/// expired: it can no longer be resumed and is removed by the next purge.
/// Purges run opportunistically on deliveries, with a probability of
/// `purge_frequency / purge_scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationConfig {
    duration: Option<Duration>,
    purge_frequency: u32,
    purge_scale: u32,
}

impl Default for ContinuationConfig {
    fn default() -> Self {
        Self {
            duration: Some(DEFAULT_CONTINUATION_DURATION),
            purge_frequency: DEFAULT_PURGE_FREQUENCY,
            purge_scale: DEFAULT_PURGE_SCALE,
        }
    }
}

impl ContinuationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` keeps parked continuations forever.
    pub fn continuation_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }

    pub fn purge_frequency(mut self, frequency: u32) -> Self {
        self.purge_frequency = frequency;
        self
    }

    pub fn purge_scale(mut self, scale: u32) -> Self {
        self.purge_scale = scale;
        self
    }

    pub fn duration(&self) -> Option<Duration> { self.duration }
    pub fn frequency(&self) -> u32 { self.purge_frequency }
    pub fn scale(&self) -> u32 { self.purge_scale }

    pub (crate) fn should_purge<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        if self.duration.is_none() || self.purge_frequency == 0 || self.purge_scale == 0 {
            return false;
        }
        rng.gen_range(0..self.purge_scale) < self.purge_frequency
    }
}
