//! Maps per-stage item counts onto one monotonic run-wide fraction.

use super::config::ProgressSlices;
use crate::events::RunPhase;

/// Highest value reported before the run completes; 1.0 is reserved
/// for [`ProgressTracker::complete`].
const BEFORE_COMPLETION: f64 = 1.0 - f64::EPSILON;

/// Tracks overall progress; the reported value never decreases
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    slices: ProgressSlices,
    reported: f64,
}

impl ProgressTracker {
    pub fn new(slices: ProgressSlices) -> Self {
        Self {
            slices,
            reported: 0.0,
        }
    }

    pub fn current(&self) -> f64 {
        self.reported
    }

    /// Progress after `done` of `total` items of `phase`
    pub fn stage(&mut self, phase: RunPhase, done: usize, total: usize) -> f64 {
        let (start, width) = self.slices.range(phase);
        let local = if total == 0 {
            1.0
        } else {
            (done as f64 / total as f64).min(1.0)
        };

        self.advance_to(start + width * local)
    }

    /// Progress at the start of `phase`
    pub fn enter(&mut self, phase: RunPhase) -> f64 {
        let (start, _) = self.slices.range(phase);
        self.advance_to(start)
    }

    pub fn complete(&mut self) -> f64 {
        self.reported = 1.0;
        self.reported
    }

    fn advance_to(&mut self, value: f64) -> f64 {
        let value = value.clamp(0.0, BEFORE_COMPLETION);
        if value > self.reported {
            self.reported = value;
        }
        self.reported
    }
}
