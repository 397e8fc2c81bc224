//! Perceptual feature prints and the default extractor.

use crate::core::decode::decode_image;
use crate::error::ComputeError;
use image_hasher::{HashAlg, HasherConfig};
use serde::{Deserialize, Serialize};

/// Opaque fixed-size descriptor of a photo's visual content.
///
/// Only ever compared through [`FeatureExtractor::distance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePrint(Vec<f32>);

impl FeaturePrint {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mean absolute difference between components.
    ///
    /// Prints of different lengths are maximally distant (1.0).
    pub fn mean_abs_difference(&self, other: &FeaturePrint) -> f64 {
        if self.0.len() != other.0.len() {
            return 1.0;
        }
        if self.0.is_empty() {
            return 0.0;
        }

        let total: f64 = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (*a as f64 - *b as f64).abs())
            .sum();
        total / self.0.len() as f64
    }
}

/// Capability that turns raw bytes into a [`FeaturePrint`]
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<FeaturePrint, ComputeError>;

    /// Distance between two prints. Must be symmetric and zero on identical prints.
    fn distance(&self, a: &FeaturePrint, b: &FeaturePrint) -> f64 {
        a.mean_abs_difference(b)
    }
}

/// Gradient-hash feature extractor.
///
/// Each hash bit becomes a 0/1 component, so the default distance is the
/// fraction of differing bits (normalized Hamming distance).
pub struct GradientFeatureExtractor {
    hasher: image_hasher::Hasher,
}

impl GradientFeatureExtractor {
    /// `hash_size` is the side of the comparison grid; prints have
    /// `hash_size * hash_size` components.
    pub fn new(hash_size: u32) -> Self {
        let hasher = HasherConfig::new()
            .hash_size(hash_size, hash_size)
            .hash_alg(HashAlg::Gradient)
            .to_hasher();

        Self { hasher }
    }
}

impl Default for GradientFeatureExtractor {
    fn default() -> Self {
        Self::new(16)
    }
}

impl FeatureExtractor for GradientFeatureExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<FeaturePrint, ComputeError> {
        let image = decode_image(bytes)?;
        let hash = self.hasher.hash_image(&image);

        let bits = hash
            .as_bytes()
            .iter()
            .flat_map(|byte| (0..8).rev().map(move |shift| ((byte >> shift) & 1) as f32))
            .collect();

        Ok(FeaturePrint::new(bits))
    }
}
