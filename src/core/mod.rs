//! # Core Module
//!
//! The presentation-agnostic duplicate analysis engine.
//!
//! ## Modules
//! - `scanner` - Discovers photos in directories
//! - `source` - Image references and byte reading
//! - `stage` - Bounded, order-preserving worker pool shared by all stages
//! - `exact` - Buckets byte-identical photos by content digest
//! - `near` - Clusters perceptually similar photos
//! - `quality` - Scores sharpness and picks each group's keeper
//! - `group` - The duplicate group result model
//! - `pipeline` - Orchestrates the full workflow

pub mod decode;
pub mod exact;
pub mod group;
pub mod near;
pub mod pipeline;
pub mod quality;
pub mod scanner;
pub mod source;
pub mod stage;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use group::{DuplicateGroup, GroupId, GroupKind};
pub use pipeline::{Analyzer, AnalysisConfig, Pipeline, RunHandle, RunSnapshot};
pub use quality::QualityScore;
pub use source::ImageRef;
