//! In-memory capability doubles shared by unit tests.

use crate::core::near::{FeatureExtractor, FeaturePrint};
use crate::core::quality::{QualityScore, SharpnessScorer};
use crate::core::source::{ContentReader, ImageBytes, ImageRef};
use crate::error::{ComputeError, ItemError};
use std::collections::HashMap;

/// Serves bytes from a table; unknown refs fail to read
#[derive(Default)]
pub struct MemoryReader {
    files: HashMap<ImageRef, Vec<u8>>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, item: &str, bytes: &[u8]) -> Self {
        self.files.insert(ImageRef::from(item), bytes.to_vec());
        self
    }
}

impl ContentReader for MemoryReader {
    fn read(&self, item: &ImageRef) -> Result<ImageBytes, ItemError> {
        self.files
            .get(item)
            .map(|bytes| ImageBytes::Owned(bytes.clone()))
            .ok_or_else(|| ItemError::Read {
                item: item.clone(),
                reason: "no such file".to_string(),
            })
    }
}

/// Maps byte payloads to one-dimensional prints; distance is `|a - b|`
#[derive(Default)]
pub struct TableExtractor {
    prints: HashMap<Vec<u8>, f32>,
}

impl TableExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, bytes: &[u8], position: f32) -> Self {
        self.prints.insert(bytes.to_vec(), position);
        self
    }
}

impl FeatureExtractor for TableExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<FeaturePrint, ComputeError> {
        self.prints
            .get(bytes)
            .map(|&p| FeaturePrint::new(vec![p]))
            .ok_or_else(|| ComputeError::Computation("no print for payload".to_string()))
    }
}

/// Maps byte payloads to fixed scores; unknown payloads fail to score
#[derive(Default)]
pub struct TableScorer {
    scores: HashMap<Vec<u8>, f64>,
}

impl TableScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, bytes: &[u8], score: f64) -> Self {
        self.scores.insert(bytes.to_vec(), score);
        self
    }
}

impl SharpnessScorer for TableScorer {
    fn score(&self, bytes: &[u8]) -> Result<QualityScore, ComputeError> {
        self.scores
            .get(bytes)
            .map(|&s| QualityScore::clamped(s))
            .ok_or_else(|| ComputeError::Decode("unscorable payload".to_string()))
    }
}
