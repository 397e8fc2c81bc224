//! Analysis configuration.

use crate::error::AnalysisError;
use crate::events::RunPhase;
use serde::{Deserialize, Serialize};

/// Default near-duplicate cut-off (lower = stricter)
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 0.30;

/// Default number of completions between cancellation checks
pub const DEFAULT_CHECK_INTERVAL: usize = 8;

/// Number of worker threads per stage when not configured
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Share of the overall progress bar given to each stage.
///
/// Hashing covers `[0, hashing)`, clustering the next `clustering`
/// and scoring the remainder up to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSlices {
    pub hashing: f64,
    pub clustering: f64,
    pub scoring: f64,
}

impl Default for ProgressSlices {
    fn default() -> Self {
        Self {
            hashing: 1.0 / 3.0,
            clustering: 1.0 / 3.0,
            scoring: 1.0 / 3.0,
        }
    }
}

impl ProgressSlices {
    /// Start and width of the slice for `phase`
    pub fn range(&self, phase: RunPhase) -> (f64, f64) {
        match phase {
            RunPhase::NotStarted => (0.0, 0.0),
            RunPhase::Hashing => (0.0, self.hashing),
            RunPhase::Clustering => (self.hashing, self.clustering),
            RunPhase::Scoring => (self.hashing + self.clustering, self.scoring),
            RunPhase::Completed | RunPhase::Cancelled => (1.0, 0.0),
        }
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        let parts = [self.hashing, self.clustering, self.scoring];
        if parts.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(AnalysisError::Config(
                "progress slices must be non-negative numbers".to_string(),
            ));
        }

        let total: f64 = parts.iter().sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(AnalysisError::Config(format!(
                "progress slices must sum to 1.0 (got {:.4})",
                total
            )));
        }

        Ok(())
    }
}

/// Configuration of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Near-duplicate cut-off; pairs strictly below it match
    pub distance_threshold: f64,
    /// Maximum items in flight per stage
    pub stage_concurrency: usize,
    /// Completed items between cancellation checks
    pub cancellation_check_interval: usize,
    pub progress_slices: ProgressSlices,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            stage_concurrency: default_concurrency(),
            cancellation_check_interval: DEFAULT_CHECK_INTERVAL,
            progress_slices: ProgressSlices::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance_threshold(mut self, threshold: f64) -> Self {
        self.distance_threshold = threshold;
        self
    }

    pub fn stage_concurrency(mut self, concurrency: usize) -> Self {
        self.stage_concurrency = concurrency;
        self
    }

    pub fn cancellation_check_interval(mut self, interval: usize) -> Self {
        self.cancellation_check_interval = interval;
        self
    }

    pub fn progress_slices(mut self, slices: ProgressSlices) -> Self {
        self.progress_slices = slices;
        self
    }

    /// Reject configurations a run cannot honour
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.distance_threshold.is_finite() || self.distance_threshold < 0.0 {
            return Err(AnalysisError::Config(format!(
                "distance threshold must be a non-negative number (got {})",
                self.distance_threshold
            )));
        }
        if self.stage_concurrency == 0 {
            return Err(AnalysisError::Config(
                "stage concurrency must be at least 1".to_string(),
            ));
        }
        if self.cancellation_check_interval == 0 {
            return Err(AnalysisError::Config(
                "cancellation check interval must be at least 1".to_string(),
            ));
        }
        self.progress_slices.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert_eq!(config.distance_threshold, 0.30);
        assert!(config.stage_concurrency >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let config = AnalysisConfig::new()
            .distance_threshold(0.1)
            .stage_concurrency(2)
            .cancellation_check_interval(3);

        assert_eq!(config.distance_threshold, 0.1);
        assert_eq!(config.stage_concurrency, 2);
        assert_eq!(config.cancellation_check_interval, 3);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(AnalysisConfig::new().distance_threshold(-1.0).validate().is_err());
        assert!(AnalysisConfig::new().distance_threshold(f64::NAN).validate().is_err());
        assert!(AnalysisConfig::new().stage_concurrency(0).validate().is_err());
        assert!(AnalysisConfig::new().cancellation_check_interval(0).validate().is_err());
    }

    #[test]
    fn slices_must_sum_to_one() {
        let uneven = ProgressSlices {
            hashing: 0.5,
            clustering: 0.2,
            scoring: 0.2,
        };
        let error = AnalysisConfig::new().progress_slices(uneven).validate().unwrap_err();
        assert!(error.to_string().contains("sum to 1.0"));

        let weighted = ProgressSlices {
            hashing: 0.5,
            clustering: 0.2,
            scoring: 0.3,
        };
        assert!(AnalysisConfig::new().progress_slices(weighted).validate().is_ok());
    }

    #[test]
    fn slice_ranges_are_contiguous() {
        let slices = ProgressSlices::default();
        let (hash_start, hash_width) = slices.range(RunPhase::Hashing);
        let (cluster_start, cluster_width) = slices.range(RunPhase::Clustering);
        let (score_start, score_width) = slices.range(RunPhase::Scoring);

        assert_eq!(hash_start, 0.0);
        assert_eq!(cluster_start, hash_start + hash_width);
        assert_eq!(score_start, cluster_start + cluster_width);
        assert!((score_start + score_width - 1.0).abs() < 1e-9);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"distance_threshold": 0.2}"#).unwrap();
        assert_eq!(config.distance_threshold, 0.2);
        assert_eq!(config.cancellation_check_interval, DEFAULT_CHECK_INTERVAL);
    }
}
