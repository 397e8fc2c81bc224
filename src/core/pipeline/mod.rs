//! # Pipeline Module
//!
//! Orchestrates the full duplicate analysis workflow.
//!
//! ## Pipeline Stages
//! 1. **Hashing** - Bucket byte-identical photos by content digest
//! 2. **Clustering** - Group perceptually close bucket representatives
//! 3. **Scoring** - Pick the sharpest member of every group
//!
//! ## Run State
//! A run moves `NotStarted -> Hashing -> Clustering -> Scoring -> Completed`
//! and may end in `Cancelled` from any stage. The control thread is the
//! only writer of the run's snapshot; stage workers hand their results
//! back to it through the stage runner.

mod analyzer;
mod config;
mod executor;
mod progress;
mod run;

pub use crate::core::stage::CancellationToken;
pub use analyzer::{Analyzer, RunHandle};
pub use config::{
    default_concurrency, AnalysisConfig, ProgressSlices, DEFAULT_CHECK_INTERVAL,
    DEFAULT_DISTANCE_THRESHOLD,
};
pub use executor::{Capabilities, Pipeline, PipelineBuilder, RunOutcome};
pub use progress::ProgressTracker;
pub use run::{RunRecorder, RunSnapshot, SharedRunState};
